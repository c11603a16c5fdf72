//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/solvetrack/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/solvetrack/` (~/.config/solvetrack/)
//! - State/Logs/Preferences: `$XDG_STATE_HOME/solvetrack/` (~/.local/state/solvetrack/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Chart defaults
    #[serde(default)]
    pub chart: ChartConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the progress backend (e.g., `https://api.example.com/Prod`)
    #[serde(default)]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_api_max_retries")]
    pub max_retries: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_api_timeout(),
            max_retries: default_api_max_retries(),
        }
    }
}

impl ApiConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("api.base_url is required".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_api_timeout() -> u64 {
    30
}

fn default_api_max_retries() -> usize {
    3
}

/// Authentication configuration
///
/// The OIDC handshake itself happens outside this client. For headless use a
/// pre-issued bearer token can be configured; an empty token means the
/// session stays anonymous.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AuthConfig {
    /// OIDC issuer URL (informational; the handshake is external)
    pub issuer: Option<String>,

    /// OIDC client id (informational; the handshake is external)
    pub client_id: Option<String>,

    /// Pre-issued bearer access token for headless sessions
    pub access_token: Option<String>,

    /// Username claim to attach to headless sessions
    pub username: Option<String>,
}

impl AuthConfig {
    /// The configured static token, if one is present and non-empty.
    pub fn static_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Chart defaults
///
/// Preference-file values override these; CLI flags override both.
#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    /// Default interval: "hour" or "day"
    #[serde(default = "default_chart_interval")]
    pub interval: String,

    /// Default mode: "total" or "delta"
    #[serde(default = "default_chart_mode")]
    pub mode: String,

    /// Default difficulty: "easy", "medium", "hard", "med_hard" or "total"
    #[serde(default = "default_chart_difficulty")]
    pub difficulty: String,

    /// Number of intervals to request from the backend
    #[serde(default = "default_chart_limit")]
    pub limit: u32,

    /// Timezone name forwarded to the backend for interval alignment
    #[serde(default = "default_chart_timezone")]
    pub timezone: String,

    /// UTC offset in minutes used for label formatting
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            interval: default_chart_interval(),
            mode: default_chart_mode(),
            difficulty: default_chart_difficulty(),
            limit: default_chart_limit(),
            timezone: default_chart_timezone(),
            utc_offset_minutes: 0,
        }
    }
}

impl ChartConfig {
    /// Configured interval; unknown values fall back to the built-in default.
    pub fn interval(&self) -> crate::analytics::ChartInterval {
        self.interval.parse().unwrap_or_default()
    }

    /// Configured mode; unknown values fall back to the built-in default.
    pub fn mode(&self) -> crate::analytics::ChartMode {
        self.mode.parse().unwrap_or_default()
    }

    /// Configured difficulty; unknown values fall back to the built-in default.
    pub fn difficulty(&self) -> crate::analytics::ChartDifficulty {
        self.difficulty.parse().unwrap_or_default()
    }
}

fn default_chart_interval() -> String {
    "day".to_string()
}

fn default_chart_mode() -> String {
    "delta".to_string()
}

fn default_chart_difficulty() -> String {
    "total".to_string()
}

fn default_chart_limit() -> u32 {
    24
}

fn default_chart_timezone() -> String {
    "UTC".to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/solvetrack/config.toml` (~/.config/solvetrack/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("solvetrack").join("config.toml")
    }

    /// Returns the state directory path (for logs and preferences)
    ///
    /// `$XDG_STATE_HOME/solvetrack/` (~/.local/state/solvetrack/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("solvetrack")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/solvetrack/solvetrack.log` (~/.local/state/solvetrack/solvetrack.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("solvetrack.log")
    }

    /// Returns the preferences file path
    ///
    /// `$XDG_STATE_HOME/solvetrack/preferences.toml`
    pub fn preferences_path() -> PathBuf {
        Self::state_dir().join("preferences.toml")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api.base_url.is_empty());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.chart.interval, "day");
        assert_eq!(config.chart.mode, "delta");
        assert_eq!(config.logging.level, "info");
        assert!(config.auth.static_token().is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://api.example.com/Prod"
timeout_secs = 10

[auth]
access_token = "eyJraWQi.example.token"
username = "alice"

[chart]
interval = "hour"
difficulty = "med_hard"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com/Prod");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.auth.static_token(), Some("eyJraWQi.example.token"));
        assert_eq!(config.auth.username.as_deref(), Some("alice"));
        assert_eq!(config.chart.interval, "hour");
        assert_eq!(config.chart.difficulty, "med_hard");
        assert_eq!(config.chart.mode, "delta");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_api_config_validation() {
        let config = ApiConfig::default();
        assert!(config.validate().is_err());

        let config = ApiConfig {
            base_url: "ftp://wrong.example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ApiConfig {
            base_url: "https://api.example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chart_config_accessors() {
        let config = ChartConfig {
            interval: "hour".to_string(),
            mode: "nonsense".to_string(),
            ..Default::default()
        };
        assert_eq!(config.interval(), crate::analytics::ChartInterval::Hour);
        // Unknown values fall back to the built-in default.
        assert_eq!(config.mode(), crate::analytics::ChartMode::Delta);
        assert_eq!(
            config.difficulty(),
            crate::analytics::ChartDifficulty::Total
        );
    }

    #[test]
    fn test_empty_static_token_is_anonymous() {
        let auth = AuthConfig {
            access_token: Some(String::new()),
            ..Default::default()
        };
        assert!(auth.static_token().is_none());
    }
}
