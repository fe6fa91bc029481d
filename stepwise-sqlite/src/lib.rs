//! SQLite ledger and executor for stepwise migrations.
//!
//! [`SqliteStore`] implements both collaborator traits of
//! `stepwise-migrate`, using `tokio-rusqlite` for asynchronous access.
//!
//! # Features
//!
//! - Ledger table compatible with existing `schemaversion` tables
//! - Checksum validation of applied migrations before migrating up
//! - One transaction per migration step
//! - In-memory and file-based databases
//!
//! # Example
//!
//! ```rust,ignore
//! use stepwise_migrate::{DirectoryCatalog, MigrationConfig, MigrationEngine, NoopNotifier, Target};
//! use stepwise_sqlite::{SqliteConfig, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open(SqliteConfig::from_url("sqlite://./app.db")?).await?;
//!     let engine = MigrationEngine::new(
//!         MigrationConfig::new(),
//!         DirectoryCatalog::new("./migrations"),
//!         store.clone(),
//!         store,
//!     );
//!
//!     let outcome = engine.run(Target::Max, &|_: &_| true, &NoopNotifier).await?;
//!     println!("{}", outcome.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{DEFAULT_TABLE, DatabasePath, SqliteConfig};
pub use error::{SqliteError, SqliteResult};
pub use store::SqliteStore;
