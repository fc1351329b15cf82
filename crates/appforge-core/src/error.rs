//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used when surfacing errors to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input: empty or duplicate names, quota limits, credential mismatches
    Validation,
    /// The path, project or user being operated on no longer exists
    NotFound,
    /// The persistence layer failed (IO, corrupt JSON, capacity)
    Storage,
}

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error for '{key}': {message}")]
    Storage { key: String, message: String },

    #[error("Storage quota exceeded while writing '{key}' ({needed} bytes, {available} available)")]
    StorageFull {
        key: String,
        needed: usize,
        available: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("'{path}' already exists")]
    AlreadyExists { path: String },

    #[error("Cannot move '{from}' into '{to}': {reason}")]
    InvalidMove {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Project limit reached: the {plan} plan allows {limit} projects")]
    QuotaExceeded { plan: String, limit: usize },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ─────────────────────────────────────────────────────────────
    // Lookup Errors
    // ─────────────────────────────────────────────────────────────
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    pub fn invalid_move(
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidMove {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            what: "File",
            name: path.into(),
        }
    }

    pub fn folder_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            what: "Folder",
            name: path.into(),
        }
    }

    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            what: "Project",
            name: id.into(),
        }
    }

    /// Classify the error for user-facing reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) | Error::Json(_) | Error::Storage { .. } | Error::StorageFull { .. } => {
                ErrorCategory::Storage
            }
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Validation { .. }
            | Error::InvalidPath { .. }
            | Error::AlreadyExists { .. }
            | Error::InvalidMove { .. }
            | Error::QuotaExceeded { .. }
            | Error::Auth { .. }
            | Error::Config { .. } => ErrorCategory::Validation,
        }
    }

    /// Check if this error came from the persistence layer
    pub fn is_storage(&self) -> bool {
        self.category() == ErrorCategory::Storage
    }

    /// Check if this is a quota violation on project creation
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Error::QuotaExceeded { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for turning low-level failures into storage errors
pub trait ResultExt<T> {
    /// Report the error as a storage failure on `key`, prefixed by `action`
    fn context(self, key: impl Into<String>, action: &str) -> Result<T>;

    /// Like `context`, building the key only on failure
    fn with_context<F>(self, key: F, action: &str) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, key: impl Into<String>, action: &str) -> Result<T> {
        self.map_err(|e| {
            let err = Error::storage(key, format!("{}: {}", action, e));
            tracing::error!("{}", err);
            err
        })
    }

    fn with_context<F>(self, key: F, action: &str) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = Error::storage(key(), format!("{}: {}", action, e));
            tracing::error!("{}", err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::already_exists("a/c.txt");
        assert_eq!(err.to_string(), "'a/c.txt' already exists");

        let err = Error::QuotaExceeded {
            plan: "FREE".to_string(),
            limit: 5,
        };
        assert!(err.to_string().contains("allows 5 projects"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_storage());
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<Vec<String>>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::file_not_found("x.txt").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::project_not_found("project_1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::invalid_move("a", "a/b", "nested").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            Error::storage("users", "disk full").category(),
            ErrorCategory::Storage
        );
        assert_eq!(Error::auth("bad").category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_quota_classification() {
        let err = Error::QuotaExceeded {
            plan: "PRO".to_string(),
            limit: 12,
        };
        assert!(err.is_quota_exceeded());
        assert!(!Error::validation("empty name").is_quota_exceeded());
    }

    #[test]
    fn test_context_wraps_as_storage_error() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.context("saved_projects", "Failed to open").unwrap_err();
        assert!(err.is_storage());
        assert_eq!(
            err.to_string(),
            "Storage error for 'saved_projects': Failed to open: denied"
        );

        let ok: std::result::Result<u8, String> = Ok(3);
        let value = ok
            .with_context(|| unreachable!("key built for a success"), "Failed to read")
            .unwrap();
        assert_eq!(value, 3);

        let failed: std::result::Result<u8, String> = Err("bad bytes".to_string());
        let err = failed
            .with_context(|| "currentUser".to_string(), "Failed to read")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::folder_not_found("src/components");
        assert_eq!(err.to_string(), "Folder not found: src/components");
    }
}
