//! Migration discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CatalogError;
use crate::migration::{Action, MigrationRecord};

/// Source of migration records for one invocation.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// List every known migration.
    async fn list(&self) -> Result<Vec<MigrationRecord>, CatalogError>;

    /// Describe where migrations are read from.
    fn location(&self) -> String;
}

#[async_trait::async_trait]
impl Catalog for Vec<MigrationRecord> {
    async fn list(&self) -> Result<Vec<MigrationRecord>, CatalogError> {
        Ok(self.clone())
    }

    fn location(&self) -> String {
        "in-memory catalog".to_string()
    }
}

/// Reads `<version>.<action>[.<name>].sql` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    migrations_dir: PathBuf,
}

impl DirectoryCatalog {
    /// Create a catalog over a directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Read a single migration file.
    async fn read_migration(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<Option<MigrationRecord>, CatalogError> {
        let Some((version, action, name)) = parse_migration_filename(filename)? else {
            debug!(filename = %filename, "Skipping non-migration file");
            return Ok(None);
        };

        let sql = tokio::fs::read_to_string(path).await?;
        Ok(Some(MigrationRecord::new(
            version, action, filename, name, sql,
        )))
    }
}

#[async_trait::async_trait]
impl Catalog for DirectoryCatalog {
    async fn list(&self) -> Result<Vec<MigrationRecord>, CatalogError> {
        if !self.migrations_dir.is_dir() {
            return Err(CatalogError::MissingDirectory(self.migrations_dir.clone()));
        }

        let mut entries = tokio::fs::read_dir(&self.migrations_dir).await?;
        let mut migrations = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };

            if let Some(record) = self.read_migration(&path, &filename).await? {
                migrations.push(record);
            }
        }

        migrations.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then(a.action.cmp(&b.action))
                .then_with(|| a.filename.cmp(&b.filename))
        });

        debug!(
            count = migrations.len(),
            dir = %self.migrations_dir.display(),
            "Loaded migrations"
        );
        Ok(migrations)
    }

    fn location(&self) -> String {
        self.migrations_dir.display().to_string()
    }
}

/// Parse a migration filename into (version, action, name).
///
/// Returns `Ok(None)` for files that are not migrations at all.
fn parse_migration_filename(
    filename: &str,
) -> Result<Option<(u64, Action, String)>, CatalogError> {
    let Some(stem) = filename.strip_suffix(".sql") else {
        return Ok(None);
    };

    let parts: Vec<&str> = stem.split('.').collect();
    if parts.len() < 2 {
        return Ok(None);
    }

    let Ok(action) = parts[1].parse::<Action>() else {
        return Ok(None);
    };

    let version = parts[0].parse::<u64>().map_err(|_| {
        CatalogError::invalid_filename(
            filename,
            format!("version '{}' is not a non-negative integer", parts[0]),
        )
    })?;

    let name = parts[2..].join(".");
    Ok(Some((version, action, name)))
}
