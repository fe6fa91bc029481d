//! Error types for the SQLite store.

use std::fmt;

use stepwise_migrate::{ExecutorError, LedgerError};

/// Result type for SQLite store operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite store operations.
#[derive(Debug)]
pub enum SqliteError {
    /// SQLite driver error.
    Sqlite(tokio_rusqlite::Error),
    /// Configuration error.
    Config(String),
    /// An applied migration no longer matches the file on disk.
    ChecksumMismatch {
        /// Migration file.
        filename: String,
        /// Checksum recorded in the ledger.
        expected: String,
        /// Checksum of the file now.
        actual: String,
    },
    /// The requested target is not a known version.
    UnknownTarget(u64),
    /// A ledger row could not be decoded.
    InvalidRow(String),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid row error.
    pub fn invalid_row(msg: impl Into<String>) -> Self {
        Self::InvalidRow(msg.into())
    }
}

impl fmt::Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "SQLite error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::ChecksumMismatch {
                filename,
                expected,
                actual,
            } => write!(
                f,
                "Checksum failed for migration {}: expected {}, got {}",
                filename, expected, actual
            ),
            Self::UnknownTarget(version) => {
                write!(f, "Target version {} does not exist", version)
            }
            Self::InvalidRow(msg) => write!(f, "Invalid ledger row: {}", msg),
        }
    }
}

impl std::error::Error for SqliteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tokio_rusqlite::Error> for SqliteError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(tokio_rusqlite::Error::Rusqlite(err))
    }
}

impl From<SqliteError> for LedgerError {
    fn from(err: SqliteError) -> Self {
        LedgerError::read(err.to_string())
    }
}

impl From<SqliteError> for ExecutorError {
    fn from(err: SqliteError) -> Self {
        ExecutorError::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqliteError::config("invalid path");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("invalid path"));
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = SqliteError::ChecksumMismatch {
            filename: "001.do.users.sql".to_string(),
            expected: "abc".to_string(),
            actual: "xyz".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("001.do.users.sql"));
        assert!(msg.contains("abc"));
        assert!(msg.contains("xyz"));
    }

    #[test]
    fn test_into_ledger_error_is_not_uninitialized() {
        let err: LedgerError = SqliteError::invalid_row("bad timestamp").into();
        assert!(matches!(err, LedgerError::Read(_)));
    }

    #[test]
    fn test_into_executor_error_downcasts() {
        let err: ExecutorError = SqliteError::UnknownTarget(9).into();
        assert!(matches!(
            err.downcast_ref::<SqliteError>(),
            Some(SqliteError::UnknownTarget(9))
        ));
    }
}
