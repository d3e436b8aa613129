//! Configuration for the mockapi server

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default data directory
pub const DEFAULT_DATA_DIR: &str = "./mockData";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for the server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,

    /// Directory holding persisted fixtures
    pub data_dir: PathBuf,

    /// Directory holding `index.html` for the home page
    pub web_root: Option<PathBuf>,

    /// Log level used when no filter directives are set in the environment
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            web_root: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

/// Explicit settings that take precedence over the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Address to listen on
    pub bind: Option<SocketAddr>,
    /// Directory holding persisted fixtures
    pub data_dir: Option<PathBuf>,
    /// Directory holding `index.html`
    pub web_root: Option<PathBuf>,
    /// Log level
    pub log_level: Option<String>,
    /// Emit logs as JSON lines
    pub json_logs: Option<bool>,
}

impl ServerConfig {
    /// Create a configuration serving fixtures from `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    /// This will look for:
    /// - `MOCKAPI_BIND` for the listen address
    /// - `MOCKAPI_DATA_DIR` for the fixture directory
    /// - `MOCKAPI_WEB_ROOT` for the home page directory
    /// - `MOCKAPI_LOG` for the log level
    /// - `MOCKAPI_LOG_JSON` for JSON log output (`true`/`1`)
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        // A missing .env file is not an error
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(bind) = env::var("MOCKAPI_BIND") {
            config.bind = bind.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    variable: "MOCKAPI_BIND",
                    value: bind.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Ok(data_dir) = env::var("MOCKAPI_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(web_root) = env::var("MOCKAPI_WEB_ROOT")
            && !web_root.is_empty()
        {
            config.web_root = Some(PathBuf::from(web_root));
        }

        if let Ok(log_level) = env::var("MOCKAPI_LOG") {
            config.log_level = log_level;
        }

        if let Ok(json_logs) = env::var("MOCKAPI_LOG_JSON") {
            config.json_logs = parse_flag(&json_logs);
        }

        Ok(config)
    }

    /// Merge explicit overrides into this configuration, overrides taking precedence.
    pub fn merge(mut self, other: ConfigOverrides) -> Self {
        if let Some(bind) = other.bind {
            self.bind = bind;
        }
        if let Some(data_dir) = other.data_dir {
            self.data_dir = data_dir;
        }
        if other.web_root.is_some() {
            self.web_root = other.web_root;
        }
        if let Some(log_level) = other.log_level {
            self.log_level = log_level;
        }
        if let Some(json_logs) = other.json_logs {
            self.json_logs = json_logs;
        }
        self
    }

    /// Check that the configuration can be served.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is missing or not a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.data_dir.exists() {
            return Err(ConfigError::MissingDataDir(self.data_dir.clone()));
        }
        if !self.data_dir.is_dir() {
            return Err(ConfigError::NotADirectory(self.data_dir.clone()));
        }
        Ok(())
    }
}

#[cfg(feature = "env")]
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
