//! `stepwise info` command - Show every migration against the ledger.

use std::path::Path;

use owo_colors::OwoColorize;
use stepwise_migrate::{
    DirectoryCatalog, MigrationConfig, MigrationEngine, StatusCounts, StatusEntry,
};

use crate::cli::InfoArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, Cell, Table};

/// Characters of SQL shown per migration
const SQL_PREVIEW_CHARS: usize = 250;

/// Run the info command
pub async fn run(args: InfoArgs) -> CliResult<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::resolve(&args.connection, &cwd)?;
    let store = super::open_store(&settings).await?;

    let engine = MigrationEngine::new(
        MigrationConfig::new(),
        DirectoryCatalog::new(settings.migrations_dir.clone()),
        store.clone(),
        store,
    );

    let entries = match engine.status().await {
        Ok(entries) => entries,
        Err(e) if e.is_ledger_uninitialized() => {
            output::plain(&format!(
                "No migrations were found. Please run {} first",
                "stepwise migrate".green()
            ));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        output::plain(&serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    output::plain(render(&entries, &settings.migrations_dir).render().trim_end());

    let counts = StatusCounts::from_entries(&entries);
    output::dim(&format!(
        "{} success, {} corrupted, {} pending",
        counts.success, counts.corrupted, counts.pending
    ));
    if counts.has_drift() {
        output::warn("Applied migrations have changed on disk since they ran");
    }

    Ok(())
}

fn render(entries: &[StatusEntry], migrations_dir: &Path) -> Table {
    let mut table = Table::new(&["NAME", "VERSION", "STATUS", "RAN_AT", "HASH", "SQL"])
        .max_width(1, 7)
        .max_width(3, 19)
        .max_width(4, 17);

    for entry in entries {
        let migration = &entry.migration;
        let ran_at = entry
            .ran_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        table.row(vec![
            Cell::new(&migration.name),
            Cell::new(migration.version.to_string()),
            Cell::styled(entry.status.as_str(), output::status_style(entry.status)),
            Cell::new(ran_at),
            Cell::new(&migration.checksum),
            Cell::new(sql_preview(&migration.sql, &migrations_dir.join(&migration.filename))),
        ]);
    }

    table
}

fn sql_preview(sql: &str, path: &Path) -> String {
    let preview: String = sql.chars().take(SQL_PREVIEW_CHARS).collect();
    format!("{}\nfile://{}", preview.trim_end(), path.display())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stepwise_migrate::{Action, MigrationRecord, MigrationStatus};

    use super::*;

    fn entry(version: u64, status: MigrationStatus, applied: bool) -> StatusEntry {
        StatusEntry {
            migration: MigrationRecord::new(
                version,
                Action::Up,
                format!("{version:03}.do.users.sql"),
                "users",
                "CREATE TABLE users (id INTEGER);",
            ),
            status,
            ran_at: applied.then(Utc::now),
        }
    }

    #[test]
    fn test_sql_preview_truncates() {
        let sql = "x".repeat(400);
        let preview = sql_preview(&sql, Path::new("/srv/migrations/001.do.sql"));
        let lines: Vec<&str> = preview.lines().collect();

        assert_eq!(lines[0].len(), SQL_PREVIEW_CHARS);
        assert_eq!(lines[1], "file:///srv/migrations/001.do.sql");
    }

    #[test]
    fn test_render_rows() {
        let entries = vec![
            entry(1, MigrationStatus::Success, true),
            entry(2, MigrationStatus::Pending, false),
        ];
        let rendered = render(&entries, Path::new("/srv/migrations")).render();

        for header in ["NAME", "VERSION", "STATUS", "RAN_AT", "HASH", "SQL"] {
            assert!(rendered.contains(header));
        }
        assert!(rendered.contains("SUCCESS"));
        assert!(rendered.contains("PENDING"));
        assert!(rendered.contains("N/A"));
        assert!(rendered.contains("file:///srv/migrations/002.do.users.sql"));
        assert!(rendered.contains("CREATE TABLE users"));
    }
}
