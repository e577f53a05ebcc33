//! Error types and handling for the `Whereabout` service

use thiserror::Error;

/// Main error type for the `Whereabout` service
///
/// Only startup paths produce these. Once the service is running, upstream
/// failures are folded into fallback payloads and never surface as errors.
#[derive(Error, Debug)]
pub enum WhereaboutError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Fallback payload could not be loaded or decoded
    #[error("Fallback error: {message}")]
    Fallback { message: String },
}

impl WhereaboutError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new fallback error
    pub fn fallback<S: Into<String>>(message: S) -> Self {
        Self::Fallback {
            message: message.into(),
        }
    }
}
