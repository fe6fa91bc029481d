//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use stepwise_sqlite::{DEFAULT_TABLE, SqliteConfig};

use crate::cli::ConnectionArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in the working directory)
pub const CONFIG_FILE_NAME: &str = "stepwise.toml";

/// Default migrations directory
pub const MIGRATIONS_DIR: &str = "migrations";

/// Stepwise configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML
    pub fn parse(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL or path
    pub url: Option<String>,

    /// Ledger table name
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory for migration files, relative to the config file
    pub directory: String,

    /// Fail on files claiming the same version and direction
    pub detect_version_conflicts: bool,

    /// Verify applied migrations before migrating up
    pub validate_checksums: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: MIGRATIONS_DIR.to_string(),
            detect_version_conflicts: false,
            validate_checksums: true,
        }
    }
}

/// Effective settings after merging the config file with CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absolute migration directory
    pub migrations_dir: PathBuf,
    /// Database URL or path
    pub database_url: String,
    /// Ledger table name
    pub table: String,
    /// Fail on conflicting migration files
    pub detect_version_conflicts: bool,
    /// Verify applied migrations before migrating up
    pub validate_checksums: bool,
}

impl Settings {
    /// Resolve settings for a command run from `cwd`.
    ///
    /// Flags win over the config file. Relative directories from the file
    /// resolve against the file's directory, relative directories from flags
    /// against `cwd`.
    pub fn resolve(args: &ConnectionArgs, cwd: &Path) -> CliResult<Self> {
        let config_path = match &args.config {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(CliError::ConfigNotFound(path));
                }
                Some(path)
            }
            None => Some(cwd.join(CONFIG_FILE_NAME)).filter(|path| path.is_file()),
        };

        let (config, base_dir) = match &config_path {
            Some(path) => (
                Config::load(path)?,
                path.parent().unwrap_or(cwd).to_path_buf(),
            ),
            None => (Config::default(), cwd.to_path_buf()),
        };

        let migrations_dir = match &args.migration_directory {
            Some(dir) => cwd.join(dir),
            None => base_dir.join(&config.migrations.directory),
        };
        if !migrations_dir.is_dir() {
            return Err(CliError::MissingDirectory(migrations_dir));
        }

        let database_url = args
            .database
            .clone()
            .or(config.database.url)
            .ok_or_else(|| {
                CliError::Config(format!(
                    "no database configured; pass --database or set [database] url in {}",
                    CONFIG_FILE_NAME
                ))
            })?;

        Ok(Self {
            migrations_dir,
            database_url,
            table: args.table.clone().unwrap_or(config.database.table),
            detect_version_conflicts: config.migrations.detect_version_conflicts,
            validate_checksums: config.migrations.validate_checksums
                && !args.no_validate_checksums,
        })
    }

    /// SQLite store configuration for these settings.
    pub fn sqlite_config(&self) -> CliResult<SqliteConfig> {
        Ok(SqliteConfig::from_url(&self.database_url)?
            .table(&self.table)
            .validate_checksums(self.validate_checksums))
    }
}
