pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tablemate",
    about = "TableMate operator CLI",
    long_about = "Inspect TableMate configuration and catalog, check readiness, and chat with the reservation assistant from a terminal.",
    after_help = "Examples:\n  tablemate doctor --json\n  tablemate catalog --restaurant \"Sakura Garden\" --dietary vegan\n  tablemate chat --restaurant \"Trattoria Roma\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, bind address, and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List restaurants, or one restaurant's menu filtered by dietary needs")]
    Catalog {
        #[arg(long, help = "Restaurant whose menu to print")]
        restaurant: Option<String>,
        #[arg(long, requires = "restaurant", help = "Comma separated restrictions, e.g. vegan,gluten_free")]
        dietary: Option<String>,
    },
    #[command(about = "Start an interactive chat session in the terminal")]
    Chat {
        #[arg(long, help = "Restaurant to chat with (defaults to catalog.default_restaurant)")]
        restaurant: Option<String>,
    },
    #[command(about = "Run a scripted booking and cancellation with per-check timing details")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Catalog { restaurant, dietary } => {
            commands::catalog::run(restaurant.as_deref(), dietary.as_deref())
        }
        Command::Chat { restaurant } => commands::chat::run(restaurant.as_deref()),
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
