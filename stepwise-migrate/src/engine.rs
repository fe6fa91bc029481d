//! Migration engine implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::conflict::detect_conflicts;
use crate::error::{ExecutorError, LedgerError, MigrateResult, MigrationError};
use crate::history::Ledger;
use crate::migration::{Action, MigrationRecord};
use crate::plan::{ExecutionPlan, Target, resolve_plan};
use crate::status::{StatusEntry, classify};

/// Configuration for the migration engine.
#[derive(Debug, Clone, Default)]
pub struct MigrationConfig {
    /// Whether to fail when two files claim the same version and direction.
    pub detect_version_conflicts: bool,
}

impl MigrationConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable conflict detection.
    pub fn detect_version_conflicts(mut self, detect: bool) -> Self {
        self.detect_version_conflicts = detect;
        self
    }
}

/// A migration the executor ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// Version of the migration.
    pub version: u64,
    /// Direction it ran in.
    pub action: Action,
    /// File it came from.
    pub filename: String,
    /// Human readable name.
    pub name: String,
    /// Checksum of the body that ran.
    pub checksum: String,
    /// When it finished.
    pub ran_at: DateTime<Utc>,
}

impl AppliedMigration {
    /// Record that `migration` ran at `ran_at`.
    pub fn from_record(migration: &MigrationRecord, ran_at: DateTime<Utc>) -> Self {
        Self {
            version: migration.version,
            action: migration.action,
            filename: migration.filename.clone(),
            name: migration.name.clone(),
            checksum: migration.checksum.clone(),
            ran_at,
        }
    }
}

/// Runs migrations against the target store and records them in the ledger.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    /// Carry the store from `plan.current_version` to `plan.target_version`.
    ///
    /// Implementations report progress through `notifier` and are
    /// responsible for any locking needed against concurrent runs.
    async fn apply(
        &self,
        plan: &ExecutionPlan,
        catalog: &[MigrationRecord],
        notifier: &dyn Notifier,
    ) -> Result<Vec<AppliedMigration>, ExecutorError>;
}

/// Observer for run progress.
///
/// Every method defaults to a no-op. Calls are made synchronously at fixed
/// points of a run and cannot affect it. Implementations must not panic,
/// including when their output cannot be written; delivery failures are
/// dropped.
pub trait Notifier: Send + Sync {
    /// The ledger does not exist yet and will be created on apply.
    fn on_ledger_missing(&self) {}

    /// The current version was determined.
    fn on_current_version(&self, _version: u64) {}

    /// The plan was resolved.
    fn on_plan(&self, _plan: &ExecutionPlan) {}

    /// The executor is verifying the checksum of an applied migration.
    fn on_validation_started(&self, _migration: &MigrationRecord) {}

    /// The executor is about to run a migration.
    fn on_migration_started(&self, _migration: &MigrationRecord) {}
}

/// A notifier that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}

/// Asks whether a resolved plan should be carried out.
pub trait ConfirmationGate {
    /// Block until an answer is available.
    fn confirm(&self, plan: &ExecutionPlan) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&ExecutionPlan) -> bool,
{
    fn confirm(&self, plan: &ExecutionPlan) -> bool {
        self(plan)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The plan was declined at the confirmation gate; nothing ran.
    Declined {
        /// The plan that was offered.
        plan: ExecutionPlan,
    },
    /// The executor finished.
    Completed {
        /// The plan that ran.
        plan: ExecutionPlan,
        /// Migrations the executor ran, in order.
        applied: Vec<AppliedMigration>,
    },
}

impl RunOutcome {
    /// Get the plan.
    pub fn plan(&self) -> &ExecutionPlan {
        match self {
            Self::Declined { plan } | Self::Completed { plan, .. } => plan,
        }
    }

    /// Migrations that ran, empty when declined.
    pub fn applied(&self) -> &[AppliedMigration] {
        match self {
            Self::Declined { .. } => &[],
            Self::Completed { applied, .. } => applied,
        }
    }

    /// Check whether the run was declined.
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined { .. })
    }

    /// Get a summary of the outcome.
    pub fn summary(&self) -> String {
        match self {
            Self::Declined { .. } => "Declined, no migrations applied".to_string(),
            Self::Completed { plan, applied } if applied.is_empty() => {
                format!("Already at version {}", plan.target_version)
            }
            Self::Completed { plan, applied } => format!(
                "{} migration{} applied, now at version {}",
                applied.len(),
                if applied.len() == 1 { "" } else { "s" },
                plan.target_version
            ),
        }
    }
}

/// The migration engine.
///
/// Runs are strictly sequential: load, conflict check, version probe,
/// target resolution, confirmation, delegation. The first failure ends the
/// run.
pub struct MigrationEngine<C, L, E>
where
    C: Catalog,
    L: Ledger,
    E: Executor,
{
    config: MigrationConfig,
    catalog: C,
    ledger: L,
    executor: E,
}

impl<C, L, E> MigrationEngine<C, L, E>
where
    C: Catalog,
    L: Ledger,
    E: Executor,
{
    /// Create a new migration engine.
    pub fn new(config: MigrationConfig, catalog: C, ledger: L, executor: E) -> Self {
        Self {
            config,
            catalog,
            ledger,
            executor,
        }
    }

    /// Load the catalog, rejecting an empty one.
    pub async fn load(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let migrations = self.catalog.list().await?;
        if migrations.is_empty() {
            return Err(MigrationError::no_migrations_found(self.catalog.location()));
        }
        debug!(count = migrations.len(), "Catalog loaded");
        Ok(migrations)
    }

    /// Fail if conflict detection is enabled and the catalog has conflicts.
    pub fn check_conflicts(&self, catalog: &[MigrationRecord]) -> MigrateResult<()> {
        if !self.config.detect_version_conflicts {
            return Ok(());
        }

        let conflicts = detect_conflicts(catalog);
        if conflicts.is_empty() {
            return Ok(());
        }

        warn!(count = conflicts.len(), "Conflicting migration versions");
        Err(MigrationError::conflicting_versions(conflicts.filenames()))
    }

    /// Read the current version, or `None` when the ledger does not exist yet.
    pub async fn probe_version(&self) -> MigrateResult<Option<u64>> {
        match self.ledger.current_version().await {
            Ok(version) => Ok(Some(version)),
            Err(LedgerError::Uninitialized) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the plan for `target` without asking or executing anything.
    pub async fn plan(&self, target: Target) -> MigrateResult<ExecutionPlan> {
        let catalog = self.load().await?;
        self.check_conflicts(&catalog)?;
        let current = self.probe_version().await?;
        Ok(resolve_plan(&catalog, current, target))
    }

    /// Run migrations towards `target`.
    ///
    /// Declining at `gate` ends the run with [`RunOutcome::Declined`]. Errors
    /// from the executor are returned unchanged and never retried.
    pub async fn run(
        &self,
        target: Target,
        gate: &dyn ConfirmationGate,
        notifier: &dyn Notifier,
    ) -> MigrateResult<RunOutcome> {
        let catalog = self.load().await?;
        self.check_conflicts(&catalog)?;

        let current = self.probe_version().await?;
        if current.is_none() {
            info!("Ledger not initialized, starting from version 0");
            notifier.on_ledger_missing();
        }

        let plan = resolve_plan(&catalog, current, target);
        notifier.on_current_version(plan.current_version);
        notifier.on_plan(&plan);
        info!(
            current = plan.current_version,
            target = plan.target_version,
            direction = %plan.direction,
            "Resolved migration plan"
        );

        if !gate.confirm(&plan) {
            info!("Migration plan declined");
            return Ok(RunOutcome::Declined { plan });
        }

        let applied = self.executor.apply(&plan, &catalog, notifier).await?;
        info!(applied = applied.len(), "Migration run complete");

        Ok(RunOutcome::Completed { plan, applied })
    }

    /// Classify every `up` migration against the ledger.
    ///
    /// Returns [`MigrationError::Ledger`] with [`LedgerError::Uninitialized`]
    /// when no ledger exists yet.
    pub async fn status(&self) -> MigrateResult<Vec<StatusEntry>> {
        let catalog = self.catalog.list().await?;
        let snapshot = self.ledger.snapshot().await?;
        Ok(classify(&catalog, &snapshot))
    }
}
