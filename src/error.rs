//! Error types and handling for `meteocast`
//!
//! Missing models are not errors: they surface as [`crate::Estimate::Unavailable`].
//! The variants here cover invalid input, broken bundle files and the
//! collaborators around the forecasting core.

use thiserror::Error;

/// Main error type for the `meteocast` library
#[derive(Error, Debug)]
pub enum MeteocastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors (horizon, anchor timestamp, variable names)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Model bundle could not be read or is structurally malformed
    #[error("Bundle error: {message}")]
    Bundle { message: String },

    /// A fitted model failed while being evaluated
    #[error("Model evaluation failed: {message}")]
    Evaluation { message: String },

    /// Time-series store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Weather API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MeteocastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new bundle error
    pub fn bundle<S: Into<String>>(message: S) -> Self {
        Self::Bundle {
            message: message.into(),
        }
    }

    /// Create a new evaluation error
    pub fn evaluation<S: Into<String>>(message: S) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MeteocastError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            MeteocastError::Validation { message } => format!("Invalid input: {message}"),
            MeteocastError::Bundle { .. } => {
                "The model bundle could not be loaded. Re-run the training step.".to_string()
            }
            MeteocastError::Evaluation { message } => {
                format!("A model could not be evaluated: {message}")
            }
            MeteocastError::Store { .. } => {
                "Time-series store operation failed. Check the store path.".to_string()
            }
            MeteocastError::Api { .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            MeteocastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for MeteocastError {
    fn from(err: serde_json::Error) -> Self {
        MeteocastError::bundle(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = MeteocastError::config("missing bundle path");
        assert!(matches!(config_err, MeteocastError::Config { .. }));

        let validation_err = MeteocastError::validation("horizon must be positive");
        assert!(matches!(validation_err, MeteocastError::Validation { .. }));

        let eval_err = MeteocastError::evaluation("non-finite slope");
        assert!(matches!(eval_err, MeteocastError::Evaluation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = MeteocastError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let validation_err = MeteocastError::validation("unknown variable 'fog'");
        assert!(validation_err.user_message().contains("unknown variable 'fog'"));

        let bundle_err = MeteocastError::bundle("bad json");
        assert!(bundle_err.user_message().contains("model bundle"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MeteocastError = io_err.into();
        assert!(matches!(err, MeteocastError::Io { .. }));
    }

    #[test]
    fn test_json_error_becomes_bundle_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MeteocastError = json_err.into();
        assert!(matches!(err, MeteocastError::Bundle { .. }));
    }
}
