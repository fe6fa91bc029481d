//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use stepwise_migrate::Target;

/// Stepwise - versioned schema migrations
#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(version)]
#[command(about = "Stepwise - versioned schema migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Migrate the database up or down to a target version
    Migrate(MigrateArgs),

    /// Show the status of every migration against the database
    Info(InfoArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Shared Arguments
// =============================================================================

/// Where to find migrations and the database
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Path to the configuration file (defaults to ./stepwise.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing migration files
    #[arg(short = 'm', long)]
    pub migration_directory: Option<PathBuf>,

    /// Database URL or path (e.g. sqlite://app.db)
    #[arg(short, long, env = "STEPWISE_DATABASE_URL")]
    pub database: Option<String>,

    /// Name of the ledger table
    #[arg(long)]
    pub table: Option<String>,

    /// Skip checksum validation of applied migrations
    #[arg(long)]
    pub no_validate_checksums: bool,
}

// =============================================================================
// Migrate Command
// =============================================================================

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Target version, or `max` for the highest available
    #[arg(long, default_value = "max")]
    pub to: Target,

    /// Fail when two migration files claim the same version and direction
    #[arg(long)]
    pub detect_version_conflicts: bool,

    /// Run without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

// =============================================================================
// Info Command
// =============================================================================

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print the status rows as JSON
    #[arg(long)]
    pub json: bool,
}
