//! # Runtime Configuration
//!
//! Read from the environment at startup.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PAYROLL_EVENTS_PATH` | `-` | JSON-lines event feed, `-` for stdin |
//! | `PAYROLL_CHANNEL_CAPACITY` | `1024` | Events buffered between reader and dispatcher |
//! | `PAYROLL_DEFAULT_PERIOD_SECS` | `2592000` | Period for organizations without one |
//! | `PAYROLL_STRICT_ORDERING` | `false` | Reject events older than the previous one |

use std::env;
use std::path::PathBuf;

use payroll_ledger::{LedgerConfig, DEFAULT_PERIOD_SECS};
use thiserror::Error;

/// Default buffer between the feed reader and the dispatcher.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("channel capacity must be greater than zero")]
    ZeroChannelCapacity,

    #[error("default period must be greater than zero seconds")]
    ZeroDefaultPeriod,
}

/// Where events are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventsPath {
    Stdin,
    File(PathBuf),
}

impl EventsPath {
    fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "-" => Self::Stdin,
            path => Self::File(PathBuf::from(path)),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub events_path: EventsPath,
    pub channel_capacity: usize,
    pub default_period_secs: u64,
    pub strict_ordering: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            events_path: EventsPath::Stdin,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            default_period_secs: DEFAULT_PERIOD_SECS,
            strict_ordering: false,
        }
    }
}

impl RuntimeConfig {
    /// Load from process environment variables and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup and validate.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("PAYROLL_EVENTS_PATH") {
            config.events_path = EventsPath::parse(&path);
        }
        if let Some(value) = lookup("PAYROLL_CHANNEL_CAPACITY") {
            config.channel_capacity = parse_number("PAYROLL_CHANNEL_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("PAYROLL_DEFAULT_PERIOD_SECS") {
            config.default_period_secs = parse_number("PAYROLL_DEFAULT_PERIOD_SECS", &value)?;
        }
        if let Some(value) = lookup("PAYROLL_STRICT_ORDERING") {
            config.strict_ordering = parse_bool("PAYROLL_STRICT_ORDERING", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        if self.default_period_secs == 0 {
            return Err(ConfigError::ZeroDefaultPeriod);
        }
        Ok(())
    }

    /// Settings handed to the ledger dispatcher.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            default_period_secs: self.default_period_secs,
            strict_ordering: self.strict_ordering,
        }
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
