//! CLI command implementations.

pub mod info;
pub mod migrate;
pub mod version;

use stepwise_sqlite::SqliteStore;

use crate::config::Settings;
use crate::error::CliResult;

/// Open the store described by `settings`.
pub(crate) async fn open_store(settings: &Settings) -> CliResult<SqliteStore> {
    Ok(SqliteStore::open(settings.sqlite_config()?).await?)
}
