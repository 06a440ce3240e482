use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::waitlist::{WaitEstimator, DEFAULT_BASE_WAIT_MINUTES, DEFAULT_MINUTES_PER_PARTY};

pub const MAX_CONFIGURABLE_PARTY_SIZE: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port).parse::<SocketAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "server.bind_address `{}` with port {} is not a valid socket address",
                self.bind_address, self.port
            ))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogConfig {
    /// Built-in demo catalog when unset.
    pub path: Option<PathBuf>,
    pub default_restaurant: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BookingConfig {
    pub max_party_size: u32,
    pub min_name_length: usize,
    pub minutes_per_party: u32,
    pub base_wait_minutes: u32,
}

impl BookingConfig {
    pub fn wait_estimator(&self) -> WaitEstimator {
        WaitEstimator {
            minutes_per_party: self.minutes_per_party,
            base_minutes: self.base_wait_minutes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub default_restaurant: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            catalog: CatalogConfig { path: None, default_restaurant: "Maison Dorée".to_string() },
            booking: BookingConfig {
                max_party_size: 8,
                min_name_length: 2,
                minutes_per_party: DEFAULT_MINUTES_PER_PARTY,
                base_wait_minutes: DEFAULT_BASE_WAIT_MINUTES,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tablemate.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
            if let Some(default_restaurant) = catalog.default_restaurant {
                self.catalog.default_restaurant = default_restaurant;
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(max_party_size) = booking.max_party_size {
                self.booking.max_party_size = max_party_size;
            }
            if let Some(min_name_length) = booking.min_name_length {
                self.booking.min_name_length = min_name_length;
            }
            if let Some(minutes_per_party) = booking.minutes_per_party {
                self.booking.minutes_per_party = minutes_per_party;
            }
            if let Some(base_wait_minutes) = booking.base_wait_minutes {
                self.booking.base_wait_minutes = base_wait_minutes;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TABLEMATE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TABLEMATE_SERVER_PORT") {
            self.server.port = parse_u16("TABLEMATE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TABLEMATE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TABLEMATE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("TABLEMATE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("TABLEMATE_DEFAULT_RESTAURANT") {
            self.catalog.default_restaurant = value;
        }

        if let Some(value) = read_env("TABLEMATE_BOOKING_MAX_PARTY_SIZE") {
            self.booking.max_party_size = parse_u32("TABLEMATE_BOOKING_MAX_PARTY_SIZE", &value)?;
        }
        if let Some(value) = read_env("TABLEMATE_BOOKING_MIN_NAME_LENGTH") {
            self.booking.min_name_length =
                parse_u32("TABLEMATE_BOOKING_MIN_NAME_LENGTH", &value)? as usize;
        }
        if let Some(value) = read_env("TABLEMATE_BOOKING_MINUTES_PER_PARTY") {
            self.booking.minutes_per_party =
                parse_u32("TABLEMATE_BOOKING_MINUTES_PER_PARTY", &value)?;
        }
        if let Some(value) = read_env("TABLEMATE_BOOKING_BASE_WAIT_MINUTES") {
            self.booking.base_wait_minutes =
                parse_u32("TABLEMATE_BOOKING_BASE_WAIT_MINUTES", &value)?;
        }

        let log_level =
            read_env("TABLEMATE_LOGGING_LEVEL").or_else(|| read_env("TABLEMATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TABLEMATE_LOGGING_FORMAT").or_else(|| read_env("TABLEMATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(default_restaurant) = overrides.default_restaurant {
            self.catalog.default_restaurant = default_restaurant;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_booking(&self.booking)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tablemate.toml"), PathBuf::from("config/tablemate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    server.socket_addr().map(|_| ())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.default_restaurant.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.default_restaurant must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if booking.max_party_size == 0 || booking.max_party_size > MAX_CONFIGURABLE_PARTY_SIZE {
        return Err(ConfigError::Validation(format!(
            "booking.max_party_size must be in range 1..={MAX_CONFIGURABLE_PARTY_SIZE}"
        )));
    }

    if booking.min_name_length == 0 {
        return Err(ConfigError::Validation(
            "booking.min_name_length must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    booking: Option<BookingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    default_restaurant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    max_party_size: Option<u32>,
    min_name_length: Option<usize>,
    minutes_per_party: Option<u32>,
    base_wait_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
