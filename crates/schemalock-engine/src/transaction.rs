use schemalock_core::Result;

use crate::database::{Database, Statement};
use crate::observer::Progress;

/// Statements that belong together, optionally reported as one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub table: Option<String>,
    pub statements: Vec<Statement>,
}

impl Batch {
    /// A batch that emits a progress marker for `table` once it has run.
    pub fn for_table(table: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            table: Some(table.into()),
            statements,
        }
    }

    pub fn unmarked(statements: Vec<Statement>) -> Self {
        Self {
            table: None,
            statements,
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Run `batches` in one transaction and return the number of statements run.
///
/// With `suspend_foreign_keys`, the dialect's disable statements run first and
/// its enable statements are attempted afterwards on both the success and the
/// error path. The transaction commits only when every statement succeeded;
/// otherwise it is rolled back and the first error is returned.
pub async fn run_phase<D>(
    db: &mut D,
    phase: &str,
    batches: &[Batch],
    suspend_foreign_keys: bool,
    progress: &dyn Progress,
) -> Result<usize>
where
    D: Database + ?Sized,
{
    let (disable, enable) = if suspend_foreign_keys {
        let dialect = db.dialect();
        (
            dialect.disable_foreign_keys_sql(),
            dialect.enable_foreign_keys_sql(),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    tracing::debug!(event = "phase_started", phase, batches = batches.len());
    db.begin().await?;

    let result = run_batches(db, &disable, batches, progress).await;
    let restored = execute_all(db, &enable).await;

    let outcome = match (result, restored) {
        (Ok(count), Ok(())) => match db.commit().await {
            Ok(()) => Ok(count),
            Err(err) => {
                rollback_quietly(db, phase).await;
                Err(err)
            }
        },
        (Err(err), restored) => {
            if let Err(restore_err) = restored {
                tracing::debug!(
                    event = "foreign_key_restore_failed",
                    phase,
                    error = %restore_err
                );
            }
            rollback_quietly(db, phase).await;
            Err(err)
        }
        (Ok(_), Err(err)) => {
            rollback_quietly(db, phase).await;
            Err(err)
        }
    };

    match &outcome {
        Ok(count) => tracing::info!(event = "phase_committed", phase, statements = *count),
        Err(err) => tracing::warn!(event = "phase_rolled_back", phase, error = %err),
    }
    outcome
}

async fn run_batches<D>(
    db: &mut D,
    disable: &[Statement],
    batches: &[Batch],
    progress: &dyn Progress,
) -> Result<usize>
where
    D: Database + ?Sized,
{
    execute_all(db, disable).await?;

    let mut count = 0;
    for batch in batches {
        execute_all(db, &batch.statements).await?;
        count += batch.len();
        if let Some(table) = &batch.table {
            progress.on_table(table);
        }
    }
    Ok(count)
}

async fn execute_all<D>(db: &mut D, statements: &[Statement]) -> Result<()>
where
    D: Database + ?Sized,
{
    for statement in statements {
        tracing::trace!(event = "statement", sql = %statement.sql, params = statement.params.len());
        db.execute(statement).await?;
    }
    Ok(())
}

async fn rollback_quietly<D>(db: &mut D, phase: &str)
where
    D: Database + ?Sized,
{
    if let Err(err) = db.rollback().await {
        tracing::warn!(event = "rollback_failed", phase, error = %err);
    }
}
