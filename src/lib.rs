//! # Stepwise
//!
//! Versioned, directional schema migrations with conflict detection,
//! drift checks, and confirmation-gated plans.
//!
//! Stepwise provides:
//! - Discovery of `NNN.do.name.sql` / `NNN.undo.name.sql` migration files
//! - Detection of files claiming the same version and direction
//! - `SUCCESS` / `CORRUPTED` / `PENDING` status for every migration
//! - Up and down migration to any known version, or to the latest
//! - A SQLite ledger and executor (feature `sqlite`, on by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepwise::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open(SqliteConfig::from_url("sqlite://app.db")?).await?;
//!     let engine = MigrationEngine::new(
//!         MigrationConfig::new().detect_version_conflicts(true),
//!         DirectoryCatalog::new("./migrations"),
//!         store.clone(),
//!         store,
//!     );
//!
//!     let outcome = engine
//!         .run(Target::Max, &|_: &ExecutionPlan| true, &NoopNotifier)
//!         .await?;
//!     println!("{}", outcome.summary());
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The reconciliation engine.
pub mod migrate {
    pub use stepwise_migrate::*;
}

/// SQLite ledger and executor.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use stepwise_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        DirectoryCatalog, ExecutionPlan, MigrationConfig, MigrationEngine, MigrationError,
        MigrationStatus, NoopNotifier, Notifier, RunOutcome, Target,
    };
    #[cfg(feature = "sqlite")]
    pub use crate::sqlite::{SqliteConfig, SqliteStore};
}

// Re-export key types at the crate root
pub use migrate::{MigrateResult, MigrationEngine, MigrationError};
