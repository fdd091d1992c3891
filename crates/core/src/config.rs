//! Service configuration.
//!
//! Values start from built-in defaults, are replaced by `clientele.toml` (or
//! `config/clientele.toml`), then by `CLIENTELE_*` environment variables, then by
//! [`ConfigOverrides`]. Validation runs last and reports every problem it finds at once.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_FILE: &str = "clientele.toml";
const FILE_CANDIDATES: [&str; 2] = [DEFAULT_FILE, "config/clientele.toml"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://clientele.db?mode=rwc".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal.
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080, graceful_shutdown_secs: 15 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Values set in code; they win over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(bind_address) = self.bind_address {
            config.server.bind_address = bind_address;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

impl LoadOptions {
    /// The file that [`AppConfig::load`] will read, if any.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.config_path {
            Some(path) => path.exists().then(|| path.clone()),
            None => FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Every externally settable value, with its file key and environment variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Setting {
    DatabaseUrl,
    DatabaseMaxConnections,
    DatabaseTimeoutSecs,
    ServerBindAddress,
    ServerPort,
    ServerGracefulShutdownSecs,
    LoggingLevel,
    LoggingFormat,
}

impl Setting {
    pub const ALL: [Setting; 8] = [
        Self::DatabaseUrl,
        Self::DatabaseMaxConnections,
        Self::DatabaseTimeoutSecs,
        Self::ServerBindAddress,
        Self::ServerPort,
        Self::ServerGracefulShutdownSecs,
        Self::LoggingLevel,
        Self::LoggingFormat,
    ];

    /// Dotted `section.key` as written in the TOML file.
    pub fn key_path(self) -> &'static str {
        match self {
            Self::DatabaseUrl => "database.url",
            Self::DatabaseMaxConnections => "database.max_connections",
            Self::DatabaseTimeoutSecs => "database.timeout_secs",
            Self::ServerBindAddress => "server.bind_address",
            Self::ServerPort => "server.port",
            Self::ServerGracefulShutdownSecs => "server.graceful_shutdown_secs",
            Self::LoggingLevel => "logging.level",
            Self::LoggingFormat => "logging.format",
        }
    }

    /// Variables consulted for this setting; the first one that is set wins.
    pub fn env_names(self) -> &'static [&'static str] {
        match self {
            Self::DatabaseUrl => &["CLIENTELE_DATABASE_URL"],
            Self::DatabaseMaxConnections => &["CLIENTELE_DATABASE_MAX_CONNECTIONS"],
            Self::DatabaseTimeoutSecs => &["CLIENTELE_DATABASE_TIMEOUT_SECS"],
            Self::ServerBindAddress => &["CLIENTELE_SERVER_BIND_ADDRESS"],
            Self::ServerPort => &["CLIENTELE_SERVER_PORT"],
            Self::ServerGracefulShutdownSecs => &["CLIENTELE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            Self::LoggingLevel => &["CLIENTELE_LOGGING_LEVEL", "CLIENTELE_LOG_LEVEL"],
            Self::LoggingFormat => &["CLIENTELE_LOGGING_FORMAT", "CLIENTELE_LOG_FORMAT"],
        }
    }

    /// The variable currently supplying this setting, if any.
    pub fn env_source(self) -> Option<&'static str> {
        self.env_value().map(|(name, _)| name)
    }

    pub fn render(self, config: &AppConfig) -> String {
        match self {
            Self::DatabaseUrl => config.database.url.clone(),
            Self::DatabaseMaxConnections => config.database.max_connections.to_string(),
            Self::DatabaseTimeoutSecs => config.database.timeout_secs.to_string(),
            Self::ServerBindAddress => config.server.bind_address.clone(),
            Self::ServerPort => config.server.port.to_string(),
            Self::ServerGracefulShutdownSecs => config.server.graceful_shutdown_secs.to_string(),
            Self::LoggingLevel => config.logging.level.clone(),
            Self::LoggingFormat => config.logging.format.as_str().to_string(),
        }
    }

    fn env_value(self) -> Option<(&'static str, String)> {
        self.env_names().iter().find_map(|name| {
            env::var(name).ok().filter(|value| !value.trim().is_empty()).map(|value| (*name, value))
        })
    }

    fn assign(self, config: &mut AppConfig, name: &str, raw: &str) -> Result<(), ConfigError> {
        match self {
            Self::DatabaseUrl => config.database.url = raw.to_string(),
            Self::DatabaseMaxConnections => config.database.max_connections = parse(name, raw)?,
            Self::DatabaseTimeoutSecs => config.database.timeout_secs = parse(name, raw)?,
            Self::ServerBindAddress => config.server.bind_address = raw.to_string(),
            Self::ServerPort => config.server.port = parse(name, raw)?,
            Self::ServerGracefulShutdownSecs => {
                config.server.graceful_shutdown_secs = parse(name, raw)?
            }
            Self::LoggingLevel => config.logging.level = raw.to_string(),
            Self::LoggingFormat => config.logging.format = parse(name, raw)?,
        }
        Ok(())
    }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: name.to_string(), value: raw.to_string() })
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match options.resolved_path() {
            Some(path) => Self::from_file(&path)?,
            None if options.require_file => {
                let expected = options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => Self::default(),
        };

        for setting in Setting::ALL {
            if let Some((name, raw)) = setting.env_value() {
                setting.assign(&mut config, name, &raw)?;
            }
        }
        options.overrides.apply(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file; absent sections and keys keep their defaults, unknown keys are errors.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems: Vec<String> = Vec::new();

        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            problems.push("database.url must be a sqlite URL such as `sqlite://clientele.db`".into());
        }
        if self.database.max_connections == 0 {
            problems.push("database.max_connections must be at least 1".into());
        }
        if !(1..=300).contains(&self.database.timeout_secs) {
            problems.push("database.timeout_secs must be between 1 and 300".into());
        }
        if self.server.bind_address.trim().is_empty() {
            problems.push("server.bind_address must not be empty".into());
        }
        if self.server.port == 0 {
            problems.push("server.port must not be 0".into());
        }
        if self.server.graceful_shutdown_secs == 0 {
            problems.push("server.graceful_shutdown_secs must be at least 1".into());
        }
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            problems.push(format!(
                "logging.level `{}` is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }
}
