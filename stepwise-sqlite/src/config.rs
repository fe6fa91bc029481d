//! SQLite store configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{SqliteError, SqliteResult};

/// Default ledger table name.
pub const DEFAULT_TABLE: &str = "schemaversion";

/// SQLite store configuration.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database path (or ":memory:" for in-memory).
    pub path: DatabasePath,
    /// Ledger table name.
    pub table: String,
    /// Verify checksums of applied migrations before migrating up.
    pub validate_checksums: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
}

/// Database path configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            table: DEFAULT_TABLE.to_string(),
            validate_checksums: true,
            busy_timeout_ms: Some(5000),
        }
    }
}

impl SqliteConfig {
    /// Create a new configuration for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a new configuration for a file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parse a SQLite URL into configuration.
    ///
    /// Supported formats:
    /// - `sqlite::memory:` or `:memory:` - In-memory database
    /// - `sqlite://path/to/db.sqlite` - File-based database
    /// - `sqlite:path/to/db.sqlite` - File-based database
    /// - `path/to/db.sqlite` - Plain path
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url_str = url.as_ref().trim();

        if url_str == "sqlite::memory:" || url_str == ":memory:" {
            return Ok(Self::memory());
        }

        let path = if let Some(path_part) = url_str.strip_prefix("sqlite://") {
            path_part
        } else if let Some(path_part) = url_str.strip_prefix("sqlite:") {
            path_part
        } else {
            url_str
        };
        let path = path.split('?').next().unwrap_or(path);

        if path.is_empty() {
            return Err(SqliteError::config("database path is required"));
        }
        if path == ":memory:" {
            return Ok(Self::memory());
        }

        Ok(Self::file(path))
    }

    /// Set the ledger table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Enable or disable checksum validation.
    pub fn validate_checksums(mut self, validate: bool) -> Self {
        self.validate_checksums = validate;
        self
    }

    /// Check the configuration before opening a connection.
    ///
    /// The table name is interpolated into SQL, so only plain identifiers
    /// are accepted.
    pub fn validate(&self) -> SqliteResult<()> {
        let mut chars = self.table.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid {
            return Err(SqliteError::config(format!(
                "invalid ledger table name '{}'",
                self.table
            )));
        }
        Ok(())
    }

    /// Generate the initialization SQL for this configuration.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();
        if let Some(timeout) = self.busy_timeout_ms {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", timeout));
        }
        sql
    }
}
