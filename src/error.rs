//! Error types and handling for Chargeguard
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Chargeguard operations
pub type Result<T> = std::result::Result<T, ChargeGuardError>;

/// Main error type for Chargeguard
#[derive(Debug, Error)]
pub enum ChargeGuardError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication/authorization errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// ChargePoint API protocol errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Network/transport errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A status-like API field carried a value the decision logic does not
    /// recognize. Fails the run loudly rather than defaulting.
    #[error("Unrecognized {field} value: {value}")]
    UnrecognizedValue { field: String, value: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ChargeGuardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Config {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Auth {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Api {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Network {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ChargeGuardError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unrecognized-value error
    pub fn unrecognized<S: Into<String>>(field: S, value: S) -> Self {
        ChargeGuardError::UnrecognizedValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ChargeGuardError {
    fn from(err: std::io::Error) -> Self {
        ChargeGuardError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChargeGuardError {
    fn from(err: serde_yaml::Error) -> Self {
        ChargeGuardError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChargeGuardError {
    fn from(err: serde_json::Error) -> Self {
        ChargeGuardError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChargeGuardError {
    fn from(err: reqwest::Error) -> Self {
        ChargeGuardError::network(err.to_string())
    }
}
