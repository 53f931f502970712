//! Error types and handling for Amber Monitor
//!
//! Every failure a view can show ends up as a [`MonitorError`]. The display
//! string of each variant is the message shown in the error banner.

use thiserror::Error;

/// Result type alias for Amber Monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for Amber Monitor
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No API key is stored; the request never left the machine
    #[error("API key not found. Please login again.")]
    MissingCredential,

    /// The API rejected the key (HTTP 401)
    #[error("Invalid API key. Please check your credentials.")]
    InvalidCredential,

    /// The API asked us to slow down (HTTP 429)
    #[error("Rate limit exceeded. Please try again in {wait_seconds} seconds.")]
    RateLimited { wait_seconds: u64 },

    /// Any other non-2xx answer from the API
    #[error("API Error: {status_code}")]
    Api { status_code: u16 },

    /// No site id stored for the current session
    #[error("No site ID found. Please login again.")]
    NoSiteId,

    /// The account has sites but none is active
    #[error("No active sites found for this account")]
    NoActiveSite,

    /// The account has no sites at all
    #[error("No sites found for this account")]
    NoSitesFound,

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Transport failures talking to the API
    #[error("Network error: {message}")]
    Network { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl MonitorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        MonitorError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        MonitorError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        MonitorError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        MonitorError::Network {
            message: message.into(),
        }
    }

    /// Create a rate-limit error with the given wait
    pub fn rate_limited(wait_seconds: u64) -> Self {
        MonitorError::RateLimited { wait_seconds }
    }

    /// Create an API status error
    pub fn api(status_code: u16) -> Self {
        MonitorError::Api { status_code }
    }

    /// Seconds to wait before retrying, only set for rate limits
    pub fn wait_seconds(&self) -> Option<u64> {
        match self {
            MonitorError::RateLimited { wait_seconds } => Some(*wait_seconds),
            _ => None,
        }
    }

    /// Whether this failure ends the session; the user must log in again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MonitorError::MissingCredential | MonitorError::InvalidCredential
        )
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for MonitorError {
    fn from(err: serde_yaml::Error) -> Self {
        MonitorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return MonitorError::Serialization {
                message: err.to_string(),
            };
        }
        MonitorError::network(err.to_string())
    }
}

impl From<chrono::ParseError> for MonitorError {
    fn from(err: chrono::ParseError) -> Self {
        MonitorError::Validation {
            field: "date".to_string(),
            message: err.to_string(),
        }
    }
}
