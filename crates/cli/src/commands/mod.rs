pub mod catalog;
pub mod chat;
pub mod config;
pub mod doctor;
pub mod smoke;

use serde::Serialize;
use tablemate_core::catalog::Catalog;
use tablemate_core::config::AppConfig;
use tablemate_core::errors::ApplicationError;

/// Exit code for configuration that fails to load or validate.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for a catalog that cannot be loaded.
pub const EXIT_CATALOG: u8 = 3;
/// Exit code for an unknown restaurant name.
pub const EXIT_NOT_FOUND: u8 = 4;
pub const EXIT_IO: u8 = 5;
pub const EXIT_SMOKE: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            escape_json(&error.to_string())
        )
    })
}

pub(crate) fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The configured catalog file, or the built-in demo catalog when unset.
pub(crate) fn load_catalog(config: &AppConfig) -> Result<Catalog, ApplicationError> {
    match &config.catalog.path {
        Some(path) => Catalog::load(path),
        None => Ok(Catalog::builtin()),
    }
}
