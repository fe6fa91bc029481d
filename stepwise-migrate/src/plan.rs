//! Target version and direction resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::migration::{Action, MigrationRecord};

/// Requested target version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// Highest `up` version in the catalog.
    #[default]
    Max,
    /// A specific version.
    Version(u64),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => f.write_str("max"),
            Self::Version(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }
        s.parse::<u64>().map(Self::Version).map_err(|_| {
            format!(
                "invalid target '{}': expected a non-negative version or 'max'",
                s
            )
        })
    }
}

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply `up` migrations.
    Up,
    /// Apply `down` migrations.
    Down,
}

impl Direction {
    /// The migration action used when moving in this direction.
    pub fn action(&self) -> Action {
        match self {
            Self::Up => Action::Up,
            Self::Down => Action::Down,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action().as_str())
    }
}

/// Resolved plan for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Version recorded in the ledger.
    pub current_version: u64,
    /// Version to migrate to.
    pub target_version: u64,
    /// Which way to move.
    pub direction: Direction,
}

impl ExecutionPlan {
    /// Build a plan, deriving the direction. Equal versions migrate up.
    pub fn new(current_version: u64, target_version: u64) -> Self {
        let direction = if target_version >= current_version {
            Direction::Up
        } else {
            Direction::Down
        };
        Self {
            current_version,
            target_version,
            direction,
        }
    }

    /// Check whether the run has nothing to do.
    pub fn is_noop(&self) -> bool {
        self.current_version == self.target_version
    }

    /// Get a one-line summary.
    pub fn summary(&self) -> String {
        format!("migrating {} to {}", self.direction, self.target_version)
    }
}

/// Current version, treating a missing ledger as version `0`.
pub fn current_version(ledger_max_version: Option<u64>) -> u64 {
    ledger_max_version.unwrap_or(0)
}

/// Highest `up` version in the catalog.
pub fn max_version(catalog: &[MigrationRecord]) -> Option<u64> {
    catalog
        .iter()
        .filter(|m| m.is_up())
        .map(|m| m.version)
        .max()
}

/// Resolve the requested target into a concrete plan.
///
/// Explicit targets are passed through unchecked; whether they are
/// reachable is for the executor to decide. `Target::Max` over a catalog
/// without `up` migrations resolves to `0`.
pub fn resolve_plan(
    catalog: &[MigrationRecord],
    ledger_max_version: Option<u64>,
    requested: Target,
) -> ExecutionPlan {
    let current = current_version(ledger_max_version);
    let target = match requested {
        Target::Max => max_version(catalog).unwrap_or(0),
        Target::Version(v) => v,
    };
    ExecutionPlan::new(current, target)
}

/// Migrations that carry the schema from the current version to the target.
///
/// Moving up runs `up` migrations in `(current, target]` ascending; moving
/// down runs `down` migrations in `(target, current]` descending.
pub fn runnable_migrations<'a>(
    catalog: &'a [MigrationRecord],
    plan: &ExecutionPlan,
) -> Vec<&'a MigrationRecord> {
    let ExecutionPlan {
        current_version: current,
        target_version: target,
        direction,
    } = *plan;

    let mut runnable: Vec<_> = match direction {
        Direction::Up => catalog
            .iter()
            .filter(|m| m.action == Action::Up && m.version > current && m.version <= target)
            .collect(),
        Direction::Down => catalog
            .iter()
            .filter(|m| m.action == Action::Down && m.version > target && m.version <= current)
            .collect(),
    };

    match direction {
        Direction::Up => runnable.sort_by_key(|m| m.version),
        Direction::Down => runnable.sort_by_key(|m| std::cmp::Reverse(m.version)),
    }
    runnable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(up_versions: &[u64], down_versions: &[u64]) -> Vec<MigrationRecord> {
        let ups = up_versions
            .iter()
            .map(|v| MigrationRecord::new(*v, Action::Up, format!("{v}.do.sql"), "", ""));
        let downs = down_versions
            .iter()
            .map(|v| MigrationRecord::new(*v, Action::Down, format!("{v}.undo.sql"), "", ""));
        ups.chain(downs).collect()
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("max".parse::<Target>().unwrap(), Target::Max);
        assert_eq!("MAX".parse::<Target>().unwrap(), Target::Max);
        assert_eq!("0".parse::<Target>().unwrap(), Target::Version(0));
        assert_eq!("007".parse::<Target>().unwrap(), Target::Version(7));
        assert!("-1".parse::<Target>().is_err());
        assert!("latest".parse::<Target>().is_err());
    }

    #[test]
    fn test_target_default_is_max() {
        assert_eq!(Target::default(), Target::Max);
        assert_eq!(Target::default().to_string(), "max");
    }

    #[test]
    fn test_current_version_defaults_to_zero() {
        assert_eq!(current_version(None), 0);
        assert_eq!(current_version(Some(4)), 4);
    }

    #[test]
    fn test_resolve_max_up() {
        let catalog = catalog(&[1, 2, 3, 4, 5], &[1, 2, 3, 4, 5, 6]);
        let plan = resolve_plan(&catalog, Some(2), Target::Max);

        assert_eq!(
            plan,
            ExecutionPlan {
                current_version: 2,
                target_version: 5,
                direction: Direction::Up,
            }
        );
    }

    #[test]
    fn test_resolve_down() {
        let catalog = catalog(&[1, 2, 3, 4, 5], &[]);
        let plan = resolve_plan(&catalog, Some(5), Target::Version(2));

        assert_eq!(plan.current_version, 5);
        assert_eq!(plan.target_version, 2);
        assert_eq!(plan.direction, Direction::Down);
    }

    #[test]
    fn test_resolve_equal_is_up() {
        for version in [0, 1, 9] {
            let plan = resolve_plan(&[], Some(version), Target::Version(version));
            assert_eq!(plan.direction, Direction::Up);
            assert!(plan.is_noop());
        }
    }

    #[test]
    fn test_resolve_missing_ledger() {
        let catalog = catalog(&[1, 2], &[]);
        let plan = resolve_plan(&catalog, None, Target::Max);

        assert_eq!(plan.current_version, 0);
        assert_eq!(plan.target_version, 2);
        assert_eq!(plan.direction, Direction::Up);
    }

    #[test]
    fn test_resolve_unknown_target_passes_through() {
        let catalog = catalog(&[1, 2], &[]);
        let plan = resolve_plan(&catalog, Some(1), Target::Version(99));
        assert_eq!(plan.target_version, 99);
    }

    #[test]
    fn test_resolve_max_without_up_migrations() {
        let catalog = catalog(&[], &[1]);
        assert_eq!(resolve_plan(&catalog, None, Target::Max).target_version, 0);
    }

    #[test]
    fn test_runnable_up() {
        let catalog = catalog(&[3, 1, 2, 4], &[1, 2, 3, 4]);
        let plan = ExecutionPlan::new(1, 3);

        let versions: Vec<_> = runnable_migrations(&catalog, &plan)
            .iter()
            .map(|m| (m.version, m.action))
            .collect();
        assert_eq!(versions, vec![(2, Action::Up), (3, Action::Up)]);
    }

    #[test]
    fn test_runnable_down() {
        let catalog = catalog(&[1, 2, 3, 4], &[1, 2, 3, 4]);
        let plan = ExecutionPlan::new(4, 1);

        let versions: Vec<_> = runnable_migrations(&catalog, &plan)
            .iter()
            .map(|m| (m.version, m.action))
            .collect();
        assert_eq!(
            versions,
            vec![(4, Action::Down), (3, Action::Down), (2, Action::Down)]
        );
    }

    #[test]
    fn test_runnable_noop() {
        let catalog = catalog(&[1, 2], &[1, 2]);
        assert!(runnable_migrations(&catalog, &ExecutionPlan::new(2, 2)).is_empty());
    }

    #[test]
    fn test_summary() {
        assert_eq!(ExecutionPlan::new(5, 2).summary(), "migrating down to 2");
        assert_eq!(ExecutionPlan::new(0, 3).summary(), "migrating up to 3");
    }
}
