//! Destructive rebuild of a database from a snapshot.
//!
//! Tables are created without foreign keys first; every foreign key is then
//! added with its own `ALTER TABLE`, so creation order never depends on the
//! reference graph.

use std::path::Path;

use schemalock_codec::read_snapshot;
use schemalock_core::{Result, Snapshot, validate_snapshot};

use crate::database::Database;
use crate::dialect::Dialect;
use crate::observer::{Confirm, Outcome, Progress, Summary};
use crate::options::LoadOptions;
use crate::transaction::{Batch, run_phase};

/// Statements that rebuild a snapshot's tables on an empty database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatePlan {
    /// One batch per table: create, indexes, comments.
    pub tables: Vec<Batch>,
    /// One batch per table that has foreign keys.
    pub foreign_keys: Vec<Batch>,
}

impl CreatePlan {
    /// Validate `snapshot` and generate its DDL without touching a database.
    pub fn build(dialect: &dyn Dialect, snapshot: &Snapshot) -> Result<Self> {
        validate_snapshot(snapshot)?;

        let mut plan = CreatePlan::default();
        for table in snapshot.tables() {
            let (local, foreign) = table.split_foreign_keys();
            plan.tables
                .push(Batch::for_table(&table.name, dialect.create_table_sql(&local)?));

            let alters: Vec<_> = foreign
                .iter()
                .filter_map(|constraint| {
                    constraint
                        .as_foreign_key()
                        .map(|fk| dialect.add_foreign_key_sql(&table.name, &constraint.name, fk))
                })
                .collect();
            if !alters.is_empty() {
                plan.foreign_keys.push(Batch::unmarked(alters));
            }
        }
        Ok(plan)
    }

    pub fn into_batches(self) -> impl Iterator<Item = Batch> {
        self.tables.into_iter().chain(self.foreign_keys)
    }
}

fn drop_batches(dialect: &dyn Dialect, tables: &[String]) -> Vec<Batch> {
    tables
        .iter()
        .map(|table| Batch::for_table(table, vec![dialect.drop_table_sql(table)]))
        .collect()
}

fn confirmed(existing: &[String], opts: &LoadOptions, confirm: &dyn Confirm) -> bool {
    if opts.assume_yes {
        return true;
    }
    let prompt = format!(
        "Drop all {} existing table(s): {}?",
        existing.len(),
        existing.join(", ")
    );
    confirm.confirm(&prompt)
}

/// Drop every existing table after confirmation.
pub async fn drop_tables<D>(
    db: &mut D,
    opts: &LoadOptions,
    confirm: &dyn Confirm,
    progress: &dyn Progress,
) -> Result<Outcome>
where
    D: Database + ?Sized,
{
    let existing = db.list_tables().await?;
    if existing.is_empty() {
        tracing::info!(event = "tables_dropped", tables = 0);
        return Ok(Outcome::Completed(Summary::default()));
    }
    if !confirmed(&existing, opts, confirm) {
        tracing::info!(event = "drop_cancelled", tables = existing.len());
        return Ok(Outcome::Cancelled);
    }

    let batches = drop_batches(db.dialect(), &existing);
    let statements = run_phase(db, "drop", &batches, true, progress).await?;
    tracing::info!(event = "tables_dropped", tables = existing.len(), statements);

    Ok(Outcome::Completed(Summary {
        tables: existing.len(),
        rows: 0,
        statements,
    }))
}

/// Read the snapshot at `path` and rebuild the database from it.
pub async fn load<D>(
    db: &mut D,
    path: &Path,
    opts: &LoadOptions,
    confirm: &dyn Confirm,
    progress: &dyn Progress,
) -> Result<Outcome>
where
    D: Database + ?Sized,
{
    let snapshot = read_snapshot(path)?;
    load_snapshot(db, &snapshot, opts, confirm, progress).await
}

/// Drop the existing tables and create the snapshot's tables in one transaction.
///
/// DDL problems are reported before the confirmation prompt and before any
/// statement runs.
pub async fn load_snapshot<D>(
    db: &mut D,
    snapshot: &Snapshot,
    opts: &LoadOptions,
    confirm: &dyn Confirm,
    progress: &dyn Progress,
) -> Result<Outcome>
where
    D: Database + ?Sized,
{
    let plan = CreatePlan::build(db.dialect(), snapshot)?;

    let existing = db.list_tables().await?;
    if !existing.is_empty() && !confirmed(&existing, opts, confirm) {
        tracing::info!(event = "load_cancelled", tables = existing.len());
        return Ok(Outcome::Cancelled);
    }

    let mut batches = drop_batches(db.dialect(), &existing);
    batches.extend(plan.into_batches());

    let statements = run_phase(db, "load", &batches, true, progress).await?;
    tracing::info!(
        event = "schema_loaded",
        dropped = existing.len(),
        tables = snapshot.len(),
        statements
    );

    Ok(Outcome::Completed(Summary {
        tables: snapshot.len(),
        rows: 0,
        statements,
    }))
}
