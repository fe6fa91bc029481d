//! SQLite ledger and executor.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use stepwise_migrate::{
    Action, AppliedMigration, Direction, ExecutionPlan, Executor, ExecutorError, Ledger,
    LedgerEntry, LedgerError, LedgerSnapshot, MigrationRecord, Notifier, runnable_migrations,
};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};

/// A SQLite database acting as both ledger and executor.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Connection>,
    config: Arc<SqliteConfig>,
}

impl SqliteStore {
    /// Open the database described by `config`.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        config.validate()?;

        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => Connection::open(path).await?,
        };

        let init_sql = config.init_sql();
        conn.call(move |conn| {
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await?;

        debug!(path = %config.path, table = %config.table, "Opened SQLite store");
        Ok(Self {
            conn: Arc::new(conn),
            config: Arc::new(config),
        })
    }

    /// Check whether a table exists.
    ///
    /// Table names compare case-insensitively, as SQLite resolves them.
    pub async fn table_exists(&self, name: &str) -> SqliteResult<bool> {
        let name = name.to_string();
        let count: i64 = self
            .conn
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                    rusqlite::params![name],
                    |row| row.get(0),
                )?)
            })
            .await?;
        Ok(count > 0)
    }

    /// Check whether the ledger table exists.
    pub async fn ledger_exists(&self) -> SqliteResult<bool> {
        self.table_exists(&self.config.table).await
    }

    /// Create the ledger table if it does not exist.
    ///
    /// The `md5` column keeps the historical name but holds SHA-256 hex.
    /// Rows written by an md5-based tool will not match and classify as
    /// corrupted.
    pub async fn ensure_ledger(&self) -> SqliteResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT,
                md5 TEXT NOT NULL,
                run_at TEXT NOT NULL
            )",
            self.config.table
        );
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Highest recorded version, `None` when the ledger table is missing.
    pub async fn max_version(&self) -> SqliteResult<Option<u64>> {
        if !self.ledger_exists().await? {
            return Ok(None);
        }

        let sql = format!("SELECT COALESCE(MAX(version), 0) FROM {}", self.config.table);
        let version: i64 = self
            .conn
            .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
            .await?;

        to_version(version).map(Some)
    }

    /// Every ledger row, `None` when the ledger table is missing.
    pub async fn load_snapshot(&self) -> SqliteResult<Option<LedgerSnapshot>> {
        if !self.ledger_exists().await? {
            return Ok(None);
        }

        let sql = format!(
            "SELECT version, md5, run_at FROM {} ORDER BY version",
            self.config.table
        );
        let rows: Vec<(i64, String, String)> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<(i64, String, String)>, _>>()?;
                Ok(rows)
            })
            .await?;

        let mut snapshot = LedgerSnapshot::new();
        for (version, checksum, run_at) in rows {
            let version = to_version(version)?;
            snapshot.insert(
                version,
                LedgerEntry::new(version, checksum, parse_timestamp(&run_at)?),
            );
        }
        Ok(Some(snapshot))
    }

    /// Carry the database through `plan`.
    pub async fn migrate(
        &self,
        plan: &ExecutionPlan,
        catalog: &[MigrationRecord],
        notifier: &dyn Notifier,
    ) -> SqliteResult<Vec<AppliedMigration>> {
        let target = plan.target_version;
        if target != 0 && !catalog.iter().any(|m| m.is_up() && m.version == target) {
            return Err(SqliteError::UnknownTarget(target));
        }

        if self.config.validate_checksums && plan.direction == Direction::Up {
            self.validate_checksums(plan.current_version, catalog, notifier)
                .await?;
        }

        self.ensure_ledger().await?;

        let mut applied = Vec::new();
        for migration in runnable_migrations(catalog, plan) {
            notifier.on_migration_started(migration);
            let ran_at = self.run_migration(migration).await?;
            info!(
                version = migration.version,
                action = %migration.action,
                filename = %migration.filename,
                "Applied migration"
            );
            applied.push(AppliedMigration::from_record(migration, ran_at));
        }

        Ok(applied)
    }

    /// Check every applied `up` migration at or below `current` against
    /// the ledger.
    async fn validate_checksums(
        &self,
        current: u64,
        catalog: &[MigrationRecord],
        notifier: &dyn Notifier,
    ) -> SqliteResult<()> {
        let Some(snapshot) = self.load_snapshot().await? else {
            return Ok(());
        };

        for migration in catalog
            .iter()
            .filter(|m| m.is_up() && m.version <= current)
        {
            let Some(entry) = snapshot.get(&migration.version) else {
                continue;
            };

            notifier.on_validation_started(migration);
            if entry.checksum != migration.checksum {
                return Err(SqliteError::ChecksumMismatch {
                    filename: migration.filename.clone(),
                    expected: entry.checksum.clone(),
                    actual: migration.checksum.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run one migration and its ledger write in a single transaction.
    async fn run_migration(&self, migration: &MigrationRecord) -> SqliteResult<DateTime<Utc>> {
        let version = i64::try_from(migration.version).map_err(|_| {
            SqliteError::config(format!("version {} is out of range", migration.version))
        })?;
        let ledger_sql = match migration.action {
            Action::Up => format!(
                "INSERT INTO {} (version, name, md5, run_at) VALUES (?1, ?2, ?3, ?4)",
                self.config.table
            ),
            Action::Down => format!("DELETE FROM {} WHERE version = ?1", self.config.table),
        };

        let action = migration.action;
        let sql = migration.sql.clone();
        let name = migration.name.clone();
        let checksum = migration.checksum.clone();
        let ran_at = Utc::now();
        let ran_at_text = ran_at.to_rfc3339();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute_batch(&sql)?;
                match action {
                    Action::Up => tx.execute(
                        &ledger_sql,
                        rusqlite::params![version, name, checksum, ran_at_text],
                    )?,
                    Action::Down => tx.execute(&ledger_sql, rusqlite::params![version])?,
                };
                tx.commit()?;
                Ok(())
            })
            .await?;

        Ok(ran_at)
    }
}

#[async_trait::async_trait]
impl Ledger for SqliteStore {
    async fn current_version(&self) -> Result<u64, LedgerError> {
        self.max_version().await?.ok_or(LedgerError::Uninitialized)
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.load_snapshot().await?.ok_or(LedgerError::Uninitialized)
    }
}

#[async_trait::async_trait]
impl Executor for SqliteStore {
    async fn apply(
        &self,
        plan: &ExecutionPlan,
        catalog: &[MigrationRecord],
        notifier: &dyn Notifier,
    ) -> Result<Vec<AppliedMigration>, ExecutorError> {
        Ok(self.migrate(plan, catalog, notifier).await?)
    }
}

fn to_version(value: i64) -> SqliteResult<u64> {
    u64::try_from(value).map_err(|_| SqliteError::invalid_row(format!("negative version {}", value)))
}

/// Parse an RFC 3339 timestamp, falling back to SQLite's `datetime()` format.
fn parse_timestamp(value: &str) -> SqliteResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ts| ts.and_utc())
        .map_err(|_| SqliteError::invalid_row(format!("unreadable run_at '{}'", value)))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use stepwise_migrate::NoopNotifier;

    use super::*;

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl Notifier for Events {
        fn on_validation_started(&self, migration: &MigrationRecord) {
            self.0.lock().unwrap().push(format!("verify {}", migration.filename));
        }

        fn on_migration_started(&self, migration: &MigrationRecord) {
            self.0.lock().unwrap().push(format!("run {}", migration.filename));
        }
    }

    fn catalog() -> Vec<MigrationRecord> {
        vec![
            MigrationRecord::new(1, Action::Up, "001.do.users.sql", "users", "CREATE TABLE users (id INTEGER);"),
            MigrationRecord::new(1, Action::Down, "001.undo.users.sql", "users", "DROP TABLE users;"),
            MigrationRecord::new(2, Action::Up, "002.do.posts.sql", "posts", "CREATE TABLE posts (id INTEGER);"),
            MigrationRecord::new(2, Action::Down, "002.undo.posts.sql", "posts", "DROP TABLE posts;"),
        ]
    }

    async fn file_store(path: &std::path::Path, table: &str) -> SqliteStore {
        SqliteStore::open(SqliteConfig::file(path).table(table))
            .await
            .unwrap()
    }

    async fn store() -> SqliteStore {
        SqliteStore::open(SqliteConfig::memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_uninitialized_ledger() {
        let store = store().await;

        assert!(matches!(
            store.current_version().await,
            Err(LedgerError::Uninitialized)
        ));
        assert!(matches!(store.snapshot().await, Err(LedgerError::Uninitialized)));
    }

    #[tokio::test]
    async fn test_empty_ledger_is_version_zero() {
        let store = store().await;
        store.ensure_ledger().await.unwrap();

        assert_eq!(store.current_version().await.unwrap(), 0);
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_migrate_up_and_down() {
        let store = store().await;
        let catalog = catalog();
        let events = Events::default();

        let applied = store
            .apply(&ExecutionPlan::new(0, 2), &catalog, &events)
            .await
            .unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(store.current_version().await.unwrap(), 2);
        assert!(store.table_exists("users").await.unwrap());
        assert!(store.table_exists("posts").await.unwrap());

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot[&1].checksum, catalog[0].checksum);

        let applied = store
            .apply(&ExecutionPlan::new(2, 0), &catalog, &events)
            .await
            .unwrap();
        let filenames: Vec<_> = applied.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(filenames, vec!["002.undo.posts.sql", "001.undo.users.sql"]);
        assert_eq!(store.current_version().await.unwrap(), 0);
        assert!(!store.table_exists("users").await.unwrap());

        assert_eq!(
            events.0.lock().unwrap().clone(),
            vec![
                "run 001.do.users.sql",
                "run 002.do.posts.sql",
                "run 002.undo.posts.sql",
                "run 001.undo.users.sql",
            ]
        );
    }

    #[tokio::test]
    async fn test_validates_checksums_before_migrating_up() {
        let store = store().await;
        let mut catalog = catalog();
        store
            .apply(&ExecutionPlan::new(0, 1), &catalog, &NoopNotifier)
            .await
            .unwrap();

        catalog[0] = catalog[0].clone().with_checksum("edited");
        let events = Events::default();
        let err = store
            .migrate(&ExecutionPlan::new(1, 2), &catalog, &events)
            .await
            .unwrap_err();

        assert!(matches!(err, SqliteError::ChecksumMismatch { .. }));
        assert_eq!(
            events.0.lock().unwrap().clone(),
            vec!["verify 001.do.users.sql"]
        );
        assert!(!store.table_exists("posts").await.unwrap());
    }

    #[tokio::test]
    async fn test_checksum_validation_can_be_disabled() {
        let store = SqliteStore::open(SqliteConfig::memory().validate_checksums(false))
            .await
            .unwrap();
        let mut catalog = catalog();
        store
            .apply(&ExecutionPlan::new(0, 1), &catalog, &NoopNotifier)
            .await
            .unwrap();

        catalog[0] = catalog[0].clone().with_checksum("edited");
        let applied = store
            .apply(&ExecutionPlan::new(1, 2), &catalog, &NoopNotifier)
            .await
            .unwrap();
        assert_eq!(applied.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let store = store().await;
        let err = store
            .migrate(&ExecutionPlan::new(0, 9), &catalog(), &NoopNotifier)
            .await
            .unwrap_err();

        assert!(matches!(err, SqliteError::UnknownTarget(9)));
        assert!(!store.ledger_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_migration_rolls_back_its_step() {
        let store = store().await;
        let mut catalog = catalog();
        catalog[2] = MigrationRecord::new(2, Action::Up, "002.do.posts.sql", "posts", "CREATE TABLE posts (;");

        let err = store
            .migrate(&ExecutionPlan::new(0, 2), &catalog, &NoopNotifier)
            .await
            .unwrap_err();

        assert!(matches!(err, SqliteError::Sqlite(_)));
        // The first step committed on its own.
        assert_eq!(store.current_version().await.unwrap(), 1);
        assert!(store.table_exists("users").await.unwrap());
    }

    #[tokio::test]
    async fn test_custom_table() {
        let store = SqliteStore::open(SqliteConfig::memory().table("_ledger"))
            .await
            .unwrap();
        store
            .apply(&ExecutionPlan::new(0, 1), &catalog(), &NoopNotifier)
            .await
            .unwrap();

        assert!(store.table_exists("_ledger").await.unwrap());
        assert!(!store.table_exists("schemaversion").await.unwrap());
    }

    #[tokio::test]
    async fn test_ledger_found_regardless_of_table_case() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("app.db");
        file_store(&path, "schemaversion")
            .await
            .apply(&ExecutionPlan::new(0, 1), &catalog(), &NoopNotifier)
            .await
            .unwrap();

        let store = file_store(&path, "SchemaVersion").await;
        assert!(store.ledger_exists().await.unwrap());
        assert_eq!(store.current_version().await.unwrap(), 1);
        assert!(store.snapshot().await.unwrap().contains_key(&1));

        let applied = store
            .apply(&ExecutionPlan::new(1, 2), &catalog(), &NoopNotifier)
            .await
            .unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].filename, "002.do.posts.sql");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_path_is_opened_on_disk() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(OsStr::from_bytes(b"app\xff.db"));
        let store = file_store(&path, "schemaversion").await;
        store
            .apply(&ExecutionPlan::new(0, 1), &catalog(), &NoopNotifier)
            .await
            .unwrap();

        assert!(path.exists());
        let reopened = file_store(&path, "schemaversion").await;
        assert_eq!(reopened.current_version().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_table_rejected_on_open() {
        let result = SqliteStore::open(SqliteConfig::memory().table("bad name")).await;
        assert!(matches!(result, Err(SqliteError::Config(_))));
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-02T03:04:05+00:00").is_ok());
        assert!(parse_timestamp("2024-01-02 03:04:05").is_ok());
        assert!(parse_timestamp("2024-01-02 03:04:05.123").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
