use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Returned when a severity name is not one of DEBUG, INFO, WARN or ERROR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity `{0}`, expected one of DEBUG, INFO, WARN, ERROR")]
pub struct UnknownSeverity(pub String);

/// A driver failed to accept, transmit or persist an event.
///
/// These never reach the caller of [`crate::Dispatcher::log`]; they are only
/// visible through a failure observer.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed encoding event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote rejected event with status {0}")]
    Status(u16),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("driver panicked while delivering")]
    Panicked,

    #[error("driver is closed")]
    Closed,
}

impl DeliveryError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Logger initialization failed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed reading configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing configuration: {0}")]
    Parse(String),

    #[error(transparent)]
    UnknownSeverity(#[from] UnknownSeverity),

    #[error("driver `{driver}` requires setting `{key}`")]
    MissingSetting { driver: String, key: &'static str },

    #[error("driver `{driver}` setting `{key}` is invalid: {reason}")]
    InvalidSetting {
        driver: String,
        key: &'static str,
        reason: String,
    },

    #[error("driver `{driver}` could not be opened: {reason}")]
    Unavailable { driver: String, reason: String },

    #[error("a `log` backend is already installed for this process")]
    LoggerInstalled,
}

impl ConfigurationError {
    pub fn unavailable(driver: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            driver: driver.into(),
            reason: reason.to_string(),
        }
    }
}
