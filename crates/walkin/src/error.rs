//! Error types for walkin.
//!
//! This module defines all error types used throughout the walkin crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::form::FormErrors;

/// The main error type for walkin operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Kiosk Errors ===
    /// The check-in form did not pass validation.
    #[error("check-in rejected: {0}")]
    Validation(#[from] FormErrors),

    /// The admin PIN did not match.
    #[error("Incorrect PIN")]
    IncorrectPin,

    /// An admin-only action was attempted outside admin mode.
    #[error("admin mode required for '{action}'")]
    AdminRequired {
        /// The refused action.
        action: &'static str,
    },

    /// No queued entry matched the given id.
    #[error("no queued entry matches '{id}'")]
    EntryNotFound {
        /// The id (or id prefix) that was looked up.
        id: String,
    },

    /// An id prefix matched more than one queued entry.
    #[error("'{prefix}' matches {count} queued entries; use more characters")]
    AmbiguousEntry {
        /// The id prefix that was looked up.
        prefix: String,
        /// How many entries matched.
        count: usize,
    },

    /// A label could not be parsed into a role or purpose.
    #[error("unknown {kind}: '{value}'")]
    UnknownChoice {
        /// Which closed set was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    // === Export Errors ===
    /// Building the CSV export failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for walkin operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unknown-choice error for a closed set of labels.
    #[must_use]
    pub fn unknown_choice(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownChoice {
            kind,
            value: value.into(),
        }
    }

    /// Check if this error is a rejected PIN.
    #[must_use]
    pub fn is_incorrect_pin(&self) -> bool {
        matches!(self, Self::IncorrectPin)
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldError, FormField};

    #[test]
    fn test_error_display() {
        assert_eq!(Error::IncorrectPin.to_string(), "Incorrect PIN");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_is_incorrect_pin() {
        assert!(Error::IncorrectPin.is_incorrect_pin());
        assert!(!Error::internal("x").is_incorrect_pin());
    }

    #[test]
    fn test_validation_error_display() {
        let errors = FormErrors::from(vec![FieldError::new(FormField::NameOrNetId, "Required")]);
        let err: Error = errors.into();
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("Required"));
        assert!(msg.contains("name"));
    }

    #[test]
    fn test_admin_required_display() {
        let err = Error::AdminRequired { action: "export" };
        assert_eq!(err.to_string(), "admin mode required for 'export'");
    }

    #[test]
    fn test_entry_not_found_display() {
        let err = Error::EntryNotFound {
            id: "abc123".to_string(),
        };
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_ambiguous_entry_display() {
        let err = Error::AmbiguousEntry {
            prefix: "a".to_string(),
            count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("'a'"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_unknown_choice_display() {
        let err = Error::unknown_choice("role", "Alumni");
        assert_eq!(err.to_string(), "unknown role: 'Alumni'");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid pin".to_string(),
        };
        assert!(err.to_string().contains("invalid pin"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
