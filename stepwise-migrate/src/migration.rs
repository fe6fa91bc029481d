//! Migration records as discovered in a catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Directional intent of a migration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Moves the schema forward to `version`.
    Up,
    /// Moves the schema back from `version`.
    Down,
}

impl Action {
    /// Get the action as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Accepts `up`/`down` as well as the `do`/`undo` spelling used by
    /// older migration directories.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "do" => Ok(Self::Up),
            "down" | "undo" => Ok(Self::Down),
            other => Err(format!("unknown migration action '{}'", other)),
        }
    }
}

/// One migration step from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Schema version this step moves to (up) or from (down).
    pub version: u64,
    /// Direction of the step.
    pub action: Action,
    /// File the step was read from.
    pub filename: String,
    /// Human readable name.
    pub name: String,
    /// Fingerprint of the migration body.
    pub checksum: String,
    /// Migration body.
    #[serde(default, skip_serializing)]
    pub sql: String,
}

impl MigrationRecord {
    /// Create a record, computing the checksum from `sql`.
    pub fn new(
        version: u64,
        action: Action,
        filename: impl Into<String>,
        name: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        let sql = sql.into();
        Self {
            version,
            action,
            filename: filename.into(),
            name: name.into(),
            checksum: compute_checksum(&sql),
            sql,
        }
    }

    /// Override the checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = checksum.into();
        self
    }

    /// Check whether this is a forward step.
    pub fn is_up(&self) -> bool {
        self.action == Action::Up
    }
}

/// Compute a SHA256 checksum of migration content.
///
/// Line endings are normalized first so a checkout with CRLF endings does
/// not register as drift.
pub fn compute_checksum(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
