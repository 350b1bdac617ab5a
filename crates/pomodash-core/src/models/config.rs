//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Longest phase we accept, in seconds (2 hours)
const MAX_DURATION: u64 = 7200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub timer: CycleConfig,
    pub daemon: DaemonConfig,
}

/// Phase lengths and the long-break cadence. Fixed once a timer is built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleConfig {
    pub focus_seconds: u64,
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
    pub sessions_before_long_break: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    pub log_level: String,
    pub tick_interval_ms: u64,
    /// Write a snapshot of the timer state on phase changes and shutdown
    pub autosave: bool,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.timer.validate()?;
        self.daemon.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            timer: CycleConfig::default(),
            daemon: DaemonConfig::default(),
        }
    }
}

impl CycleConfig {
    /// Validate cycle configuration
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("Focus duration", self.focus_seconds),
            ("Short break duration", self.short_break_seconds),
            ("Long break duration", self.long_break_seconds),
        ];

        for (name, seconds) in durations {
            if seconds == 0 {
                return Err(Error::Validation(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
            if seconds > MAX_DURATION {
                return Err(Error::Validation(format!(
                    "{} too long (max {} seconds)",
                    name, MAX_DURATION
                )));
            }
        }

        if self.sessions_before_long_break == 0 {
            return Err(Error::Validation(
                "Sessions before long break must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn focus_minutes(&self) -> u64 {
        self.focus_seconds / 60
    }

    pub fn short_break_minutes(&self) -> u64 {
        self.short_break_seconds / 60
    }

    pub fn long_break_minutes(&self) -> u64 {
        self.long_break_seconds / 60
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            focus_seconds: 1500,      // 25 minutes
            short_break_seconds: 300, // 5 minutes
            long_break_seconds: 900,  // 15 minutes
            sessions_before_long_break: 4,
        }
    }
}

impl DaemonConfig {
    /// Validate daemon configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.tick_interval_ms == 0 || self.tick_interval_ms > 60_000 {
            return Err(Error::Validation(format!(
                "Tick interval must be between 1 and 60000 ms, got {}",
                self.tick_interval_ms
            )));
        }

        Ok(())
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_interval_ms: 1000,
            autosave: true,
        }
    }
}
