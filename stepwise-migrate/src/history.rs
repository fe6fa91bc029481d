//! Ledger of applied migrations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A ledger row recorded when a version's `up` migration was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Version reached.
    pub version: u64,
    /// Checksum of the migration at the time it was applied.
    pub checksum: String,
    /// When the migration was applied.
    pub ran_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new ledger entry.
    pub fn new(version: u64, checksum: impl Into<String>, ran_at: DateTime<Utc>) -> Self {
        Self {
            version,
            checksum: checksum.into(),
            ran_at,
        }
    }
}

/// Ledger rows keyed by version.
pub type LedgerSnapshot = BTreeMap<u64, LedgerEntry>;

/// Read access to the ledger kept by the target store.
///
/// Both methods return [`LedgerError::Uninitialized`] when the store has
/// no ledger yet. Any other failure must use a different variant.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Highest applied version, `0` for an existing but empty ledger.
    async fn current_version(&self) -> Result<u64, LedgerError>;

    /// Every ledger row.
    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError>;
}
