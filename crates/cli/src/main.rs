use std::process::ExitCode;

fn main() -> ExitCode {
    tablemate_cli::run()
}
