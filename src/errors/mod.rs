use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Driver Error: {0}")]
    DriverError(#[from] DriverError),

    #[error("Validation Error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Configuration Error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

/// Why a remote call against a hypervisor management endpoint failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverFailure {
    Unreachable,
    Auth,
    Timeout,
    MalformedResponse,
}

impl fmt::Display for DriverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverFailure::Unreachable => write!(f, "unreachable"),
            DriverFailure::Auth => write!(f, "auth"),
            DriverFailure::Timeout => write!(f, "timeout"),
            DriverFailure::MalformedResponse => write!(f, "malformed-response"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} failure talking to {endpoint}: {message}")]
pub struct DriverError {
    pub reason: DriverFailure,
    pub endpoint: String,
    pub message: String,
}

impl DriverError {
    pub fn new(reason: DriverFailure, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason,
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn unreachable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DriverFailure::Unreachable, endpoint, message)
    }

    pub fn auth(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DriverFailure::Auth, endpoint, message)
    }

    pub fn timeout(endpoint: impl Into<String>, after: Duration) -> Self {
        Self::new(
            DriverFailure::Timeout,
            endpoint,
            format!("no answer within {}ms", after.as_millis()),
        )
    }

    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DriverFailure::MalformedResponse, endpoint, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.reason == DriverFailure::Timeout
    }
}

/// Rejections raised by the ready-wait duration check. A zero value is not
/// an error; see `StartupWaitCheck::Warning`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not a number: {value:?}")]
    NotANumber { value: String },

    #[error("Negative value: {value}")]
    Negative { value: i64 },
}

// Result type alias for convenience
pub type FleetResult<T> = Result<T, FleetError>;
