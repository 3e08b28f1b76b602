//! Unified error handling for TALOS
//!
//! This module provides a centralized error type for the entire TALOS system,
//! ensuring consistent error handling across all components.

use thiserror::Error;

/// Main error type for TALOS operations
#[derive(Debug, Error)]
pub enum TalosError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A schedule request lost arbitration against a non-interruptible owner
    #[error("Resource conflict: subsystem '{subsystem}' is held by non-interruptible command '{owner}'")]
    ResourceConflict { subsystem: String, owner: String },

    /// A composite command was constructed with an invalid child set
    #[error("Invalid composite: {0}")]
    InvalidComposite(String),

    /// Scheduling errors
    #[error("Scheduling error: {0}")]
    Scheduling(String),

    /// Record/replay errors
    #[error("Replay error: {0}")]
    Replay(String),

    /// Driver-related errors
    #[error("Driver error: {0}")]
    Driver(String),

    /// Telemetry sink errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input/argument errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic internal errors (use sparingly)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Catch-all for other error types
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using TalosError
pub type TalosResult<T> = Result<T, TalosError>;

// Implement conversions from common error types
impl From<serde_json::Error> for TalosError {
    fn from(err: serde_json::Error) -> Self {
        TalosError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for TalosError {
    fn from(err: toml::de::Error) -> Self {
        TalosError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for TalosError {
    fn from(err: toml::ser::Error) -> Self {
        TalosError::Serialization(format!("TOML serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for TalosError {
    fn from(err: serde_yaml::Error) -> Self {
        TalosError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<bincode::Error> for TalosError {
    fn from(err: bincode::Error) -> Self {
        TalosError::Serialization(format!("bincode error: {}", err))
    }
}

impl From<anyhow::Error> for TalosError {
    fn from(err: anyhow::Error) -> Self {
        TalosError::Other(err.to_string())
    }
}

impl From<&str> for TalosError {
    fn from(msg: &str) -> Self {
        TalosError::Other(msg.to_string())
    }
}

impl From<String> for TalosError {
    fn from(msg: String) -> Self {
        TalosError::Other(msg)
    }
}

// Helper methods
impl TalosError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        TalosError::Config(msg.into())
    }

    /// Create a resource conflict error from subsystem and owner names
    pub fn resource_conflict<S: Into<String>, T: Into<String>>(subsystem: S, owner: T) -> Self {
        TalosError::ResourceConflict {
            subsystem: subsystem.into(),
            owner: owner.into(),
        }
    }

    /// Create an invalid composite error
    pub fn invalid_composite<S: Into<String>>(msg: S) -> Self {
        TalosError::InvalidComposite(msg.into())
    }

    /// Create a scheduling error
    pub fn scheduling<S: Into<String>>(msg: S) -> Self {
        TalosError::Scheduling(msg.into())
    }

    /// Create a replay error
    pub fn replay<S: Into<String>>(msg: S) -> Self {
        TalosError::Replay(msg.into())
    }

    /// Create a driver error
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        TalosError::Driver(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        TalosError::NotFound(resource.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        TalosError::InvalidInput(msg.into())
    }

    /// Check if this is a resource conflict error
    pub fn is_resource_conflict(&self) -> bool {
        matches!(self, TalosError::ResourceConflict { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, TalosError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_conflict_message() {
        let err = TalosError::resource_conflict("drivetrain", "drive_distance");
        assert!(err.is_resource_conflict());
        assert_eq!(
            err.to_string(),
            "Resource conflict: subsystem 'drivetrain' is held by non-interruptible command 'drive_distance'"
        );
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            TalosError::invalid_composite("empty"),
            TalosError::InvalidComposite(_)
        ));
        assert!(TalosError::not_found("subsystem").is_not_found());
    }
}
