//! CLI error types and result alias.

use std::path::PathBuf;

use miette::Diagnostic;
use stepwise_migrate::MigrationError;
use stepwise_sqlite::SqliteError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(stepwise::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(stepwise::config))]
    Config(String),

    /// An explicitly named config file is missing
    #[error("Config file not found: {}", .0.display())]
    #[diagnostic(code(stepwise::config_not_found))]
    ConfigNotFound(PathBuf),

    /// The migration directory is missing
    #[error("Directory \"{}\" does not exist.", .0.display())]
    #[diagnostic(
        code(stepwise::missing_directory),
        help("pass --migration-directory or set [migrations] directory in stepwise.toml")
    )]
    MissingDirectory(PathBuf),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(stepwise::migration))]
    Migration(#[from] MigrationError),

    /// Database error
    #[error("{0}")]
    #[diagnostic(code(stepwise::database))]
    Database(#[from] SqliteError),

    /// Output error
    #[error("Failed to serialize JSON: {0}")]
    #[diagnostic(code(stepwise::output))]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}
