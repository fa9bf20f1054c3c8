//! Error types shared by TaxGuard crates.

use thiserror::Error;

/// Result type alias using the TaxGuard error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for configuration and startup.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this is a configuration error.
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("port must be non-zero".into());
        assert!(err.is_config());
        assert_eq!(err.to_string(), "Configuration error: port must be non-zero");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(!err.is_config());
        assert!(err.to_string().starts_with("JSON error"));
    }
}
