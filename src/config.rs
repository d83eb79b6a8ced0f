//! Configuration management for Chargeguard
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{ChargeGuardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ChargePoint account configuration
    pub chargepoint: ChargePointConfig,

    /// Monitoring policy configuration
    pub monitor: MonitorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// ChargePoint account parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargePointConfig {
    /// Account username
    pub username: String,

    /// Account password
    pub password: String,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Monitoring policy tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll interval while waiting for a session worth monitoring, or for
    /// the current session to change (seconds)
    pub idle_poll_interval_secs: u64,

    /// Poll interval while actively watching power draw (seconds)
    pub active_poll_interval_secs: u64,

    /// Power draw below this is considered "low" (kW)
    pub low_power_threshold_kw: f64,

    /// Consecutive low-power polls before charging is stopped
    pub low_power_streak_threshold: u32,

    /// If set, only sessions on these operators are stopped
    pub company_name_whitelist: Option<BTreeSet<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (empty disables file logging)
    pub file: String,

    /// Number of rotated log files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for ChargePointConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval_secs: 15 * 60,
            active_poll_interval_secs: 2 * 60,
            low_power_threshold_kw: 0.1,
            low_power_streak_threshold: 3,
            company_name_whitelist: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/chargeguard.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chargepoint: ChargePointConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Whether the given operator passes the configured whitelist
    pub fn company_allowed(&self, company_name: &str) -> bool {
        match &self.company_name_whitelist {
            Some(whitelist) => whitelist.contains(company_name),
            None => true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the environment override or default locations
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("CHARGEGUARD_CONFIG") {
            return Self::from_file(path);
        }

        let default_paths = [
            "chargeguard_config.yaml",
            "/etc/chargeguard/config.yaml",
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

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chargepoint.username.is_empty() {
            return Err(ChargeGuardError::validation(
                "chargepoint.username",
                "Username cannot be empty",
            ));
        }

        if self.chargepoint.password.is_empty() {
            return Err(ChargeGuardError::validation(
                "chargepoint.password",
                "Password cannot be empty",
            ));
        }

        if self.chargepoint.request_timeout_secs == 0 {
            return Err(ChargeGuardError::validation(
                "chargepoint.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.monitor.idle_poll_interval_secs == 0 {
            return Err(ChargeGuardError::validation(
                "monitor.idle_poll_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.monitor.active_poll_interval_secs == 0 {
            return Err(ChargeGuardError::validation(
                "monitor.active_poll_interval_secs",
                "Must be greater than 0",
            ));
        }

        if !self.monitor.low_power_threshold_kw.is_finite()
            || self.monitor.low_power_threshold_kw < 0.0
        {
            return Err(ChargeGuardError::validation(
                "monitor.low_power_threshold_kw",
                "Must be a non-negative number",
            ));
        }

        if self.monitor.low_power_streak_threshold == 0 {
            return Err(ChargeGuardError::validation(
                "monitor.low_power_streak_threshold",
                "Must be greater than 0",
            ));
        }

        if let Some(whitelist) = &self.monitor.company_name_whitelist
            && whitelist.is_empty()
        {
            return Err(ChargeGuardError::validation(
                "monitor.company_name_whitelist",
                "Whitelist cannot be empty when set; omit it to allow all operators",
            ));
        }

        Ok(())
    }
}
