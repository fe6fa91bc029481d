//! Error types for the migration engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can end a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The catalog could not be read.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The catalog was read but contained no migrations.
    #[error("No migration files found from \"{location}\"")]
    NoMigrationsFound {
        /// Where the catalog looked.
        location: String,
    },

    /// Two or more files claim the same version and direction.
    #[error("Conflicting migration file versions:\n{}", .filenames.join("\n"))]
    ConflictingVersions {
        /// Offending filenames, in discovery order.
        filenames: Vec<String>,
    },

    /// The ledger could not be read.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The executor failed while applying migrations.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl MigrationError {
    /// Create a conflicting versions error.
    pub fn conflicting_versions<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ConflictingVersions {
            filenames: filenames.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a no-migrations-found error.
    pub fn no_migrations_found(location: impl Into<String>) -> Self {
        Self::NoMigrationsFound {
            location: location.into(),
        }
    }

    /// Check whether this error only says the ledger has not been created yet.
    pub fn is_ledger_uninitialized(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::Uninitialized))
    }
}

/// Errors raised while discovering migrations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The migrations directory is missing.
    #[error("Directory \"{}\" does not exist.", .0.display())]
    MissingDirectory(PathBuf),

    /// A file looked like a migration but its name could not be parsed.
    #[error("Invalid migration filename '{filename}': {reason}")]
    InvalidFilename {
        /// The offending filename.
        filename: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl CatalogError {
    /// Create an invalid filename error.
    pub fn invalid_filename(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilename {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while reading the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No ledger exists yet in the target store.
    #[error("ledger has not been initialized")]
    Uninitialized,

    /// The ledger exists but could not be read.
    #[error("{0}")]
    Read(String),
}

impl LedgerError {
    /// Create a read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }
}

/// An opaque failure from the executor.
///
/// The engine never inspects these; callers can downcast to the concrete
/// store error when they need to.
pub struct ExecutorError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl ExecutorError {
    /// Wrap a store error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    /// Borrow the underlying error as a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_versions_display() {
        let err = MigrationError::conflicting_versions(["a.sql", "b.sql"]);
        assert_eq!(
            err.to_string(),
            "Conflicting migration file versions:\na.sql\nb.sql"
        );
    }

    #[test]
    fn test_no_migrations_display() {
        let err = MigrationError::no_migrations_found("./migrations");
        assert!(err.to_string().contains("\"./migrations\""));
    }

    #[test]
    fn test_missing_directory_display() {
        let err = CatalogError::MissingDirectory(PathBuf::from("/tmp/nope"));
        assert_eq!(err.to_string(), "Directory \"/tmp/nope\" does not exist.");
    }

    #[test]
    fn test_is_ledger_uninitialized() {
        assert!(MigrationError::Ledger(LedgerError::Uninitialized).is_ledger_uninitialized());
        assert!(!MigrationError::Ledger(LedgerError::read("locked")).is_ledger_uninitialized());
    }

    #[test]
    fn test_executor_error_is_forwarded_verbatim() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: MigrationError = ExecutorError::new(io).into();
        assert_eq!(err.to_string(), "disk full");

        let MigrationError::Executor(inner) = err else {
            panic!("expected executor error");
        };
        assert!(inner.downcast_ref::<std::io::Error>().is_some());
    }
}
