use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tablemate_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

/// Config key, its primary env override, and an optional legacy alias.
const FIELDS: &[(&str, &str, Option<&str>)] = &[
    ("server.bind_address", "TABLEMATE_SERVER_BIND_ADDRESS", None),
    ("server.port", "TABLEMATE_SERVER_PORT", None),
    ("server.graceful_shutdown_secs", "TABLEMATE_SERVER_GRACEFUL_SHUTDOWN_SECS", None),
    ("catalog.path", "TABLEMATE_CATALOG_PATH", None),
    ("catalog.default_restaurant", "TABLEMATE_DEFAULT_RESTAURANT", None),
    ("booking.max_party_size", "TABLEMATE_BOOKING_MAX_PARTY_SIZE", None),
    ("booking.min_name_length", "TABLEMATE_BOOKING_MIN_NAME_LENGTH", None),
    ("booking.minutes_per_party", "TABLEMATE_BOOKING_MINUTES_PER_PARTY", None),
    ("booking.base_wait_minutes", "TABLEMATE_BOOKING_BASE_WAIT_MINUTES", None),
    ("logging.level", "TABLEMATE_LOGGING_LEVEL", Some("TABLEMATE_LOG_LEVEL")),
    ("logging.format", "TABLEMATE_LOGGING_FORMAT", Some("TABLEMATE_LOG_FORMAT")),
];

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    CommandResult { exit_code: 0, output: render(&config) }
}

pub fn render(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, alias) in FIELDS {
        let source = field_source(
            key,
            &[Some(*env_key), *alias],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {key} = {} (source: {source})", value_of(config, key)));
    }

    lines.join("\n")
}

fn value_of(config: &AppConfig, key: &str) -> String {
    match key {
        "server.bind_address" => config.server.bind_address.clone(),
        "server.port" => config.server.port.to_string(),
        "server.graceful_shutdown_secs" => config.server.graceful_shutdown_secs.to_string(),
        "catalog.path" => config
            .catalog
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<builtin>".to_string()),
        "catalog.default_restaurant" => config.catalog.default_restaurant.clone(),
        "booking.max_party_size" => config.booking.max_party_size.to_string(),
        "booking.min_name_length" => config.booking.min_name_length.to_string(),
        "booking.minutes_per_party" => config.booking.minutes_per_party.to_string(),
        "booking.base_wait_minutes" => config.booking.base_wait_minutes.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format).to_lowercase(),
        _ => "<unknown>".to_string(),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    ["tablemate.toml", "config/tablemate.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[Option<&str>],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().flatten().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}
