//! Configuration management for Amber Monitor
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. The config file location can be overridden
//! with the `AMBER_MONITOR_CONFIG` environment variable.

use crate::error::{MonitorError, Result};
use crate::report::LiveRange;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "AMBER_MONITOR_CONFIG";

/// Environment variable holding an API key for `login`
pub const API_KEY_ENV: &str = "AMBER_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Amber API connection settings
    pub api: ApiConfig,

    /// Where the session values are kept
    pub store: StoreConfig,

    /// Overview report settings
    pub report: ReportConfig,

    /// Live view and timer settings
    pub live: LiveConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Timezone used to derive calendar dates ("local" for the machine zone)
    pub timezone: String,
}

/// Amber API connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the version prefix
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Price interval length in minutes
    pub resolution_minutes: u32,
}

/// Session store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON session file
    pub path: String,
}

/// Overview report parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of trailing days in the overview
    pub overview_days: u32,

    /// Widest date span the API accepts per request
    pub max_chunk_days: u32,
}

/// Live view parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Auto-refresh period in seconds
    pub refresh_interval_seconds: u64,

    /// Range used when none is given (6h, 12h, 24h, today)
    pub default_range: String,

    /// Countdown tick in milliseconds
    pub retry_tick_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Zone used to turn interval timestamps into calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerZone {
    /// The machine's local zone
    Local,
    /// A named IANA zone
    Named(chrono_tz::Tz),
}

impl ViewerZone {
    /// Parse "local" or an IANA zone name
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        trimmed
            .parse::<chrono_tz::Tz>()
            .map(Self::Named)
            .map_err(|_| MonitorError::validation("timezone", "Unknown timezone name"))
    }

    /// Calendar date of an instant as seen by the viewer
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Wall-clock time formatted HH:MM in the viewer's zone
    pub fn time_label(&self, instant: DateTime<Utc>) -> String {
        match self {
            Self::Local => instant.with_timezone(&Local).format("%H:%M").to_string(),
            Self::Named(tz) => instant.with_timezone(tz).format("%H:%M").to_string(),
        }
    }

    /// Today's date in the viewer's zone
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the env override or default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(path);
        }

        let default_paths = [
            "amber_monitor.yaml",
            "/data/amber_monitor.yaml",
            "/etc/amber-monitor/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parsed viewer zone
    pub fn viewer_zone(&self) -> Result<ViewerZone> {
        ViewerZone::parse(&self.timezone)
    }

    /// Parsed default live range
    pub fn default_live_range(&self) -> Result<LiveRange> {
        self.live.default_range.parse()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(MonitorError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(MonitorError::validation(
                "api.timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if self.api.resolution_minutes == 0 {
            return Err(MonitorError::validation(
                "api.resolution_minutes",
                "Must be greater than 0",
            ));
        }

        if self.report.overview_days == 0 {
            return Err(MonitorError::validation(
                "report.overview_days",
                "Must be greater than 0",
            ));
        }

        // The API rejects windows wider than seven days
        if self.report.max_chunk_days == 0 || self.report.max_chunk_days > 7 {
            return Err(MonitorError::validation(
                "report.max_chunk_days",
                "Must be between 1 and 7",
            ));
        }

        if self.live.refresh_interval_seconds == 0 {
            return Err(MonitorError::validation(
                "live.refresh_interval_seconds",
                "Must be greater than 0",
            ));
        }

        if self.live.retry_tick_ms == 0 {
            return Err(MonitorError::validation(
                "live.retry_tick_ms",
                "Must be greater than 0",
            ));
        }

        self.default_live_range()?;
        self.viewer_zone()?;

        Ok(())
    }
}
