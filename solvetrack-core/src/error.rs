//! Error types for solvetrack-core

use thiserror::Error;

/// Main error type for the solvetrack-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response from the backend API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded into the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication provider error
    #[error("authentication error: {0}")]
    Auth(String),
}

impl Error {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Transport failures and 5xx responses are transient; everything else
    /// (4xx, decode, config) fails the same way on every attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for solvetrack-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(Error::Http("connection refused".to_string()).is_transient());
        assert!(Error::Api {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
        assert!(!Error::Api {
            status: 401,
            message: "unauthorized".to_string()
        }
        .is_transient());
        assert!(!Error::Decode("bad payload".to_string()).is_transient());
    }
}
