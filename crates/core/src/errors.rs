//! Error types for the mergeview core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`ViewerError`] enum unifies them for callers that want a single
//! error type.
//!
//! A cancelled input switch is deliberately absent from this module: it is
//! reported as [`SwitchOutcome::Cancelled`](crate::controller::SwitchOutcome)
//! so callers never confuse "the user said no" with a failure.

use thiserror::Error;

use crate::side::Side;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the controller.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

/// Errors raised by a content provider while saving a side.
///
/// These are recoverable: the side stays dirty so the save can be retried.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Writing the backing file failed.
    #[error("failed to write {side} content to '{path}': {source}")]
    Io {
        side: Side,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The provider has no writable backing for this side.
    #[error("{0} side is read-only")]
    ReadOnly(Side),

    /// The provider refused the content.
    #[error("{side} content rejected: {detail}")]
    Rejected { side: Side, detail: String },
}

impl PersistenceError {
    /// The side the failed save targeted.
    pub fn side(&self) -> Side {
        match self {
            Self::Io { side, .. } | Self::Rejected { side, .. } => *side,
            Self::ReadOnly(side) => *side,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = PersistenceError::ReadOnly(Side::Left);
        assert_eq!(err.to_string(), "left side is read-only");

        let err = PersistenceError::Rejected {
            side: Side::Right,
            detail: "disk full".into(),
        };
        assert_eq!(err.to_string(), "right content rejected: disk full");

        let err = ConfigError::InvalidValue {
            field: "viewer.save_policy".into(),
            detail: "unknown policy".into(),
        };
        assert!(err.to_string().contains("viewer.save_policy"));
    }

    #[test]
    fn test_persistence_error_side() {
        let err = PersistenceError::Io {
            side: Side::Right,
            path: "/tmp/x".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.side(), Side::Right);
        assert!(err.to_string().contains("/tmp/x"));
    }

    #[test]
    fn test_viewer_error_from_subsystem() {
        let err: ViewerError = PersistenceError::ReadOnly(Side::Left).into();
        assert!(matches!(err, ViewerError::Persistence(_)));

        let err: ViewerError = ConfigError::FileNotFound("x.toml".into()).into();
        assert!(matches!(err, ViewerError::Config(_)));
    }
}
