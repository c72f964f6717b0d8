//! Domain-specific error types for the encoding configuration engine.
//!
//! Internal modules return typed errors (e.g., [`TargetError`],
//! [`ConfigError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! EncfixError
//! ├── Config(ConfigError)    settings file loading and validation
//! ├── Target(TargetError)    per-target read, parse and write failures
//! └── Session(SessionError)  orchestration (reentrancy guard)
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

/// Top-level error type for the engine.
#[derive(Error, Debug)]
pub enum EncfixError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A managed target could not be read, parsed or written.
    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    /// The session refused or lost an operation.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors that arise from loading `settings.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file exists but is not valid TOML for the schema.
    #[error("Invalid settings in {file}: {message}")]
    InvalidSyntax {
        /// Path of the offending file.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading the settings file.
    #[error("IO error reading settings file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Failures touching a single managed target.
///
/// Detection folds these into the target's drift report; apply aborts the
/// remaining steps on them; restore reports them per step.
#[derive(Error, Debug)]
pub enum TargetError {
    /// The target executable or file is absent.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing item.
        what: String,
    },

    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    ReadFailure {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The file was read but its content is malformed.
    #[error("cannot parse {path}: {message}")]
    ParseFailure {
        /// Path of the malformed file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// A privileged write was rejected.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// Path or registry key that rejected the write.
        path: String,
    },

    /// Any other failure.
    #[error("{0}")]
    Unexpected(String),
}

impl TargetError {
    /// Classify an I/O error raised while touching `path`.
    #[must_use]
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let display = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { what: display },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: display },
            io::ErrorKind::InvalidData => Self::ParseFailure {
                path: display,
                message: err.to_string(),
            },
            _ => Self::ReadFailure {
                path: display,
                source: err,
            },
        }
    }

    /// Whether this failure should only degrade the target to "skip".
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by the session orchestrator.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Another detection, apply or restore is still running.
    #[error("another operation is already running")]
    Busy,

    /// The background worker ended without reporting an outcome.
    #[error("background worker terminated unexpectedly")]
    WorkerLost,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn from_io_classifies_not_found() {
        let e = TargetError::from_io(
            &PathBuf::from("/home/u/.bashrc"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(e, TargetError::NotFound { .. }));
        assert!(e.is_soft());
        assert_eq!(e.to_string(), "not found: /home/u/.bashrc");
    }

    #[test]
    fn from_io_classifies_permission_denied() {
        let e = TargetError::from_io(
            &PathBuf::from("/etc/profile"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(e, TargetError::PermissionDenied { .. }));
        assert!(!e.is_soft());
    }

    #[test]
    fn from_io_classifies_invalid_data_as_parse_failure() {
        let e = TargetError::from_io(
            &PathBuf::from("settings.json"),
            io::Error::new(io::ErrorKind::InvalidData, "bad utf-8"),
        );
        assert!(matches!(e, TargetError::ParseFailure { .. }));
    }

    #[test]
    fn from_io_falls_back_to_read_failure() {
        use std::error::Error as StdError;
        let e = TargetError::from_io(
            &PathBuf::from("profile.ps1"),
            io::Error::other("disk on fire"),
        );
        assert!(matches!(e, TargetError::ReadFailure { .. }));
        assert!(e.source().is_some());
        assert!(e.to_string().contains("profile.ps1"));
    }

    #[test]
    fn session_busy_display() {
        assert_eq!(
            SessionError::Busy.to_string(),
            "another operation is already running"
        );
    }

    #[test]
    fn top_level_wraps_sub_errors() {
        let e: EncfixError = TargetError::Unexpected("boom".to_string()).into();
        assert_eq!(e.to_string(), "Target error: boom");
        let e: EncfixError = SessionError::Busy.into();
        assert!(e.to_string().starts_with("Session error"));
        let e: EncfixError = ConfigError::InvalidSyntax {
            file: "settings.toml".to_string(),
            message: "expected `=`".to_string(),
        }
        .into();
        assert!(e.to_string().contains("settings.toml"));
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let e: anyhow::Error = TargetError::PermissionDenied {
            path: r"HKCU\Console".to_string(),
        }
        .into();
        assert!(e.to_string().contains("permission denied"));
    }
}
