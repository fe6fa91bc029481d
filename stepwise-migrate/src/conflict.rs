//! Detection of migrations that claim the same version and direction.

use indexmap::{IndexMap, IndexSet};

use crate::migration::{Action, MigrationRecord};

/// Migrations that share a `(version, action)` with a differently named file.
///
/// Entries are keyed by filename and kept in discovery order. Equality
/// ignores order, so two sets built from permutations of the same catalog
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet<'a> {
    entries: IndexMap<&'a str, &'a MigrationRecord>,
}

impl<'a> ConflictSet<'a> {
    /// Check if no conflicts were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of conflicting files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if a file is part of a conflict.
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// Conflicting filenames in discovery order.
    pub fn filenames(&self) -> Vec<&'a str> {
        self.entries.keys().copied().collect()
    }
}

/// Find every migration whose `(version, action)` is also claimed by a
/// file with a different name.
///
/// Records are grouped by `(version, action)`; any group holding more than
/// one distinct filename contributes all of its records.
pub fn detect_conflicts(catalog: &[MigrationRecord]) -> ConflictSet<'_> {
    let mut groups: IndexMap<(u64, Action), IndexSet<&str>> = IndexMap::new();
    for migration in catalog {
        groups
            .entry((migration.version, migration.action))
            .or_default()
            .insert(migration.filename.as_str());
    }

    let mut entries = IndexMap::new();
    for migration in catalog {
        let conflicting = groups
            .get(&(migration.version, migration.action))
            .is_some_and(|filenames| filenames.len() > 1);

        if conflicting {
            entries
                .entry(migration.filename.as_str())
                .or_insert(migration);
        }
    }

    ConflictSet { entries }
}

/// Check whether two migrations conflict.
pub fn are_conflicting(a: &MigrationRecord, b: &MigrationRecord) -> bool {
    a.action == b.action && a.version == b.version && a.filename != b.filename
}
