//! Status classification of catalog migrations against the ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::LedgerSnapshot;
use crate::migration::MigrationRecord;

/// Status of an `up` migration relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MigrationStatus {
    /// Applied with the checksum currently on disk.
    Success,
    /// Applied, but the file has changed since.
    Corrupted,
    /// Not applied.
    Pending,
}

impl MigrationStatus {
    /// Get the status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Corrupted => "CORRUPTED",
            Self::Pending => "PENDING",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// The catalog record.
    pub migration: MigrationRecord,
    /// Its status.
    pub status: MigrationStatus,
    /// When it was applied, if it was.
    pub ran_at: Option<DateTime<Utc>>,
}

/// Classify every `up` migration in catalog order.
///
/// `down` migrations have no ledger counterpart and are left out.
pub fn classify(catalog: &[MigrationRecord], ledger: &LedgerSnapshot) -> Vec<StatusEntry> {
    catalog
        .iter()
        .filter(|m| m.is_up())
        .map(|m| match ledger.get(&m.version) {
            None => StatusEntry {
                migration: m.clone(),
                status: MigrationStatus::Pending,
                ran_at: None,
            },
            Some(entry) => StatusEntry {
                migration: m.clone(),
                status: if entry.checksum == m.checksum {
                    MigrationStatus::Success
                } else {
                    MigrationStatus::Corrupted
                },
                ran_at: Some(entry.ran_at),
            },
        })
        .collect()
}

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Applied and unchanged.
    pub success: usize,
    /// Applied and changed since.
    pub corrupted: usize,
    /// Not applied.
    pub pending: usize,
}

impl StatusCounts {
    /// Tally a classification.
    pub fn from_entries(entries: &[StatusEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            match entry.status {
                MigrationStatus::Success => counts.success += 1,
                MigrationStatus::Corrupted => counts.corrupted += 1,
                MigrationStatus::Pending => counts.pending += 1,
            }
            counts
        })
    }

    /// Check whether any applied migration has drifted.
    pub fn has_drift(&self) -> bool {
        self.corrupted > 0
    }
}
