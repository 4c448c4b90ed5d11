//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/leanline/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/leanline/` (~/.config/leanline/)
//! - Data: `$XDG_DATA_HOME/leanline/` (~/.local/share/leanline/)
//! - State/Logs: `$XDG_STATE_HOME/leanline/` (~/.local/state/leanline/)

use crate::error::{Error, Result};
use crate::types::UnitSystem;
use chrono::Weekday;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "leanline";

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

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
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
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Display preferences
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics configuration
#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// First day of the week for weekly buckets ("sunday", "mon", ...)
    #[serde(default = "default_week_start")]
    pub week_start: String,

    /// Days in the trailing log-count window, today included
    #[serde(default = "default_log_window_days")]
    pub log_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            week_start: default_week_start(),
            log_window_days: default_log_window_days(),
        }
    }
}

impl AnalyticsConfig {
    /// Parsed `week_start`.
    pub fn week_start_day(&self) -> Result<Weekday> {
        self.week_start.trim().parse::<Weekday>().map_err(|_| {
            Error::Config(format!(
                "analytics.week_start must be a weekday name, got {:?}",
                self.week_start
            ))
        })
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        self.week_start_day()?;
        if self.log_window_days == 0 {
            return Err(Error::Config(
                "analytics.log_window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_week_start() -> String {
    "sunday".to_string()
}

fn default_log_window_days() -> u32 {
    7
}

/// Display preferences
///
/// Only used when a profile is created without an explicit unit system;
/// stored values are always kilograms.
#[derive(Debug, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub unit_system: UnitSystem,
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
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.analytics.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/leanline/config.toml` (~/.config/leanline/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/leanline/` (~/.local/share/leanline/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join(APP_DIR)
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/leanline/` (~/.local/state/leanline/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/leanline/leanline.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("leanline.db")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// Called by the CLI before anything reads these paths so that every
    /// component resolves the same directories.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

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
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.week_start, "sunday");
        assert_eq!(config.analytics.log_window_days, 7);
        assert_eq!(config.display.unit_system, UnitSystem::Metric);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.analytics.week_start_day().unwrap(), Weekday::Sun);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
week_start = "Monday"
log_window_days = 14

[display]
unit_system = "imperial"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.week_start_day().unwrap(), Weekday::Mon);
        assert_eq!(config.analytics.log_window_days, 14);
        assert_eq!(config.display.unit_system, UnitSystem::Imperial);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_analytics_config_validation() {
        assert!(AnalyticsConfig::default().validate().is_ok());

        let config = AnalyticsConfig {
            week_start: "caturday".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = AnalyticsConfig {
            log_window_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[analytics]\nweek_start = \"sat\"").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analytics.week_start_day().unwrap(), Weekday::Sat);

        std::fs::write(&path, "[analytics]\nlog_window_days = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_paths_use_app_dir() {
        assert!(Config::database_path().ends_with("leanline/leanline.db"));
        assert!(Config::state_dir().ends_with("leanline"));
        assert!(Config::config_path().ends_with("leanline/config.toml"));
    }
}
