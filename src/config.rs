//! Bridge configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Top-level bridge configuration, usually read from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Hub base URL. A trailing `/` is optional.
    pub base_url: String,
    /// Name carried on every log record of the bridge.
    #[serde(default = "default_logger_name")]
    pub logger_name: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Optional proxy URL (http, https or socks5).
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
    pub token: TokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bearer token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Shared HS256 secret.
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. Rotated files get a date suffix appended to it.
    #[serde(default = "default_log_file")]
    pub file: String,
    /// How often the log file is rotated.
    #[serde(default)]
    pub rotation: LogRotation,
    /// Number of log files kept, the active one included.
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

fn default_logger_name() -> String {
    "message-hub-bridge".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("message-hub-bridge/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_issuer() -> String {
    "message-hub-bridge".to_string()
}

fn default_ttl() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/message-hub-bridge.log".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            rotation: LogRotation::default(),
            max_files: default_max_log_files(),
        }
    }
}

impl TokenConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MESSAGE_HUB_BASE_URL`: Override the hub base URL
    /// - `MESSAGE_HUB_JWT_SECRET`: Override the token secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("MESSAGE_HUB_BASE_URL") {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }
        if let Ok(secret) = std::env::var("MESSAGE_HUB_JWT_SECRET") {
            if !secret.is_empty() {
                self.token.secret = secret;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.token.secret.is_empty() {
            return Err(Error::Config("token.secret must not be empty".to_string()));
        }
        if self.token.ttl_secs == 0 {
            return Err(Error::Config("token.ttl_secs must be greater than 0".to_string()));
        }
        if self.logging.max_files == 0 {
            return Err(Error::Config("logging.max_files must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
base_url = "https://hub.example.com"

[token]
secret = "s3cret"
"#;

    #[test]
    fn test_parse_minimal_applies_defaults() {
        let config = BridgeConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.base_url, "https://hub.example.com");
        assert_eq!(config.logger_name, "message-hub-bridge");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.proxy.is_none());
        assert!(!config.danger_accept_invalid_certs);
        assert_eq!(config.token.ttl(), Duration::from_secs(300));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.rotation, LogRotation::Daily);
        assert_eq!(config.logging.max_files, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full() {
        let toml = r#"
base_url = "http://localhost:8080/"
logger_name = "pms-bridge"
timeout_secs = 5
user_agent = "pms/2.0"
proxy = "socks5://127.0.0.1:9050"
danger_accept_invalid_certs = true

[token]
secret = "abc"
issuer = "pms"
ttl_secs = 60

[logging]
level = "debug"
file = "/tmp/bridge.log"
rotation = "hourly"
max_files = 3
"#;
        let config = BridgeConfig::parse(toml).unwrap();
        assert_eq!(config.logger_name, "pms-bridge");
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(config.token.issuer, "pms");
        assert_eq!(config.logging.file, "/tmp/bridge.log");
        assert_eq!(config.logging.rotation, LogRotation::Hourly);
        assert_eq!(config.logging.max_files, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_missing_token_section_fails() {
        let err = BridgeConfig::parse(r#"base_url = "https://hub.example.com""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BridgeConfig::parse(MINIMAL).unwrap();
        config.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.base_url = "ftp://hub.example.com".to_string();
        assert!(config.validate().is_err());

        config.base_url = "https://hub.example.com".to_string();
        config.token.secret.clear();
        assert!(config.validate().is_err());

        config.token.secret = "s".to_string();
        config.token.ttl_secs = 0;
        assert!(config.validate().is_err());

        config.token.ttl_secs = 60;
        config.logging.max_files = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.token.secret, "s3cret");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = BridgeConfig::load("/nonexistent/bridge.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
