//! # stepwise-migrate
//!
//! Reconciliation engine for versioned, directional schema migrations.
//!
//! This crate provides:
//! - Discovery of `<version>.<action>[.<name>].sql` migration files
//! - Detection of files that claim the same version and direction
//! - Classification of each migration against the ledger (`SUCCESS`,
//!   `CORRUPTED`, `PENDING`)
//! - Resolution of the current version, target version, and direction
//! - A confirmation-gated run that delegates execution to a store
//!
//! ## Architecture
//!
//! The engine never talks to a database itself. It reads a [`Catalog`] and a
//! [`Ledger`], and hands the resolved plan to an [`Executor`].
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐
//! │   Catalog    │────▶│ Conflict Check │
//! └──────────────┘     └────────────────┘
//!        │                     │
//!        ▼                     ▼
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │    Ledger    │────▶│  Plan Resolver │────▶│ Confirmation │
//! └──────────────┘     └────────────────┘     └──────────────┘
//!        │                                           │
//!        ▼                                           ▼
//! ┌──────────────┐                           ┌──────────────┐
//! │ Status View  │                           │   Executor   │
//! └──────────────┘                           └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use stepwise_migrate::{DirectoryCatalog, MigrationConfig, MigrationEngine, NoopNotifier, Target};
//!
//! async fn run_migrations(store: impl Ledger + Executor + Clone) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MigrationConfig::new().detect_version_conflicts(true);
//!     let catalog = DirectoryCatalog::new("./migrations");
//!     let engine = MigrationEngine::new(config, catalog, store.clone(), store);
//!
//!     let outcome = engine
//!         .run(Target::Max, &|_plan: &ExecutionPlan| true, &NoopNotifier)
//!         .await?;
//!     println!("{}", outcome.summary());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! migrations/
//! ├── 001.do.create_users.sql
//! ├── 001.undo.create_users.sql
//! ├── 002.do.add_posts.sql
//! └── 002.undo.add_posts.sql
//! ```
//!
//! `do`/`up` files move the schema forward to their version; `undo`/`down`
//! files move it back from their version.

pub mod catalog;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod history;
pub mod migration;
pub mod plan;
pub mod status;

// Re-exports
pub use catalog::{Catalog, DirectoryCatalog};
pub use conflict::{ConflictSet, are_conflicting, detect_conflicts};
pub use engine::{
    AppliedMigration, ConfirmationGate, Executor, MigrationConfig, MigrationEngine, NoopNotifier,
    Notifier, RunOutcome,
};
pub use error::{CatalogError, ExecutorError, LedgerError, MigrateResult, MigrationError};
pub use history::{Ledger, LedgerEntry, LedgerSnapshot};
pub use migration::{Action, MigrationRecord, compute_checksum};
pub use plan::{
    Direction, ExecutionPlan, Target, current_version, resolve_plan, runnable_migrations,
};
pub use status::{MigrationStatus, StatusCounts, StatusEntry, classify};
