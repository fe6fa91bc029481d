//! `stepwise migrate` command - Move the database to a target version.

use stepwise_migrate::{
    ConfirmationGate, DirectoryCatalog, ExecutionPlan, MigrationConfig, MigrationEngine,
    MigrationRecord, Notifier, RunOutcome,
};

use crate::cli::MigrateArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the migrate command
pub async fn run(args: MigrateArgs) -> CliResult<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::resolve(&args.connection, &cwd)?;
    let store = super::open_store(&settings).await?;

    let config = MigrationConfig::new().detect_version_conflicts(
        settings.detect_version_conflicts || args.detect_version_conflicts,
    );
    let engine = MigrationEngine::new(
        config,
        DirectoryCatalog::new(settings.migrations_dir.clone()),
        store.clone(),
        store,
    );

    let notifier = CliNotifier::new(&settings.table);
    let gate = PromptGate::new(args.yes);
    let outcome = engine.run(args.to, &gate, &notifier).await?;

    if let RunOutcome::Completed { applied, .. } = &outcome {
        output::newline();
        for migration in applied {
            output::list_item(&format!("{} ({})", migration.filename, migration.action));
        }
        output::success(&outcome.summary());
    }

    Ok(())
}

/// Prints run progress as timestamped lines.
pub struct CliNotifier {
    table: String,
    write: Box<dyn Fn(&str) + Send + Sync>,
}

impl CliNotifier {
    /// Create a notifier printing through [`output::log`]
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_writer(table, output::log)
    }

    /// Create a notifier handing every line to `write`
    pub fn with_writer(
        table: impl Into<String>,
        write: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        Self {
            table: table.into(),
            write: Box::new(write),
        }
    }
}

impl Notifier for CliNotifier {
    fn on_ledger_missing(&self) {
        (self.write)(&format!("table {} does not exist - creating it.", self.table));
    }

    fn on_current_version(&self, version: u64) {
        (self.write)(&format!("version of database is: {}", version));
    }

    fn on_plan(&self, plan: &ExecutionPlan) {
        (self.write)(&plan.summary());
    }

    fn on_validation_started(&self, migration: &MigrationRecord) {
        (self.write)(&format!(
            "verifying checksum of migration {}",
            migration.filename
        ));
    }

    fn on_migration_started(&self, migration: &MigrationRecord) {
        (self.write)(&format!("running {}", migration.filename));
    }
}

/// Asks on the terminal before running, unless told to assume yes.
#[derive(Debug, Clone, Copy)]
pub struct PromptGate {
    assume_yes: bool,
}

impl PromptGate {
    /// Create a gate; `assume_yes` skips the prompt
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmationGate for PromptGate {
    fn confirm(&self, _plan: &ExecutionPlan) -> bool {
        let confirmed = self.assume_yes || output::confirm("Do you want to run the migrations?");
        if confirmed {
            output::plain("A bold choice, Running the migrations.");
        } else {
            output::newline();
            output::plain("A wise choice, until next time.");
        }
        confirmed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use stepwise_migrate::Action;

    use super::*;

    fn recording(table: &str) -> (CliNotifier, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let notifier = CliNotifier::with_writer(table, move |line| {
            sink.lock().unwrap().push(line.to_string());
        });
        (notifier, lines)
    }

    #[test]
    fn test_notifier_messages() {
        let (notifier, lines) = recording("schemaversion");
        let migration = MigrationRecord::new(1, Action::Up, "001.do.users.sql", "users", "");

        notifier.on_ledger_missing();
        notifier.on_current_version(0);
        notifier.on_plan(&ExecutionPlan::new(0, 1));
        notifier.on_validation_started(&migration);
        notifier.on_migration_started(&migration);

        assert_eq!(
            lines.lock().unwrap().clone(),
            vec![
                "table schemaversion does not exist - creating it.",
                "version of database is: 0",
                "migrating up to 1",
                "verifying checksum of migration 001.do.users.sql",
                "running 001.do.users.sql",
            ]
        );
    }

    #[test]
    fn test_notifier_uses_configured_table() {
        let (notifier, lines) = recording("ledger");
        notifier.on_ledger_missing();
        assert_eq!(
            lines.lock().unwrap()[0],
            "table ledger does not exist - creating it."
        );
    }

    #[test]
    fn test_notifier_survives_failing_output() {
        struct Closed;

        impl std::io::Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
        }

        let notifier =
            CliNotifier::with_writer("schemaversion", |line| output::log_to(&mut Closed, line));
        let migration = MigrationRecord::new(1, Action::Up, "001.do.users.sql", "users", "");

        notifier.on_ledger_missing();
        notifier.on_current_version(0);
        notifier.on_plan(&ExecutionPlan::new(0, 1));
        notifier.on_migration_started(&migration);
    }

    #[test]
    fn test_gate_assumes_yes() {
        assert!(PromptGate::new(true).confirm(&ExecutionPlan::new(0, 3)));
    }
}
