//! Seed import: replay rows of a seed file into existing tables.

use std::path::Path;

use schemalock_codec::read_seed;
use schemalock_core::{
    ColumnDefinition, Result, Row, SeedSet, TableSchema, forward_references, union_columns,
};

use crate::database::Database;
use crate::dialect::Dialect;
use crate::observer::{Outcome, Progress, Summary};
use crate::options::SeedImportOptions;
use crate::transaction::{Batch, run_phase};

/// Statements that insert `rows` into the live `table`.
///
/// Columns are the union of the row keys in first-seen order, restricted to
/// columns of the live table; absent keys bind `NULL`. Rows are split into
/// several inserts only when one would exceed the dialect's parameter limit.
pub fn insert_batch(dialect: &dyn Dialect, table: &TableSchema, rows: &[Row]) -> Batch {
    let mut columns: Vec<&ColumnDefinition> = Vec::new();
    for key in union_columns(rows) {
        match table.column(&key) {
            Some(column) => columns.push(column),
            None => tracing::warn!(
                event = "seed_column_dropped",
                table = %table.name,
                column = %key,
                "seed column does not exist in the table and is ignored"
            ),
        }
    }

    if rows.is_empty() || columns.is_empty() {
        if !rows.is_empty() {
            tracing::warn!(
                event = "seed_rows_skipped",
                table = %table.name,
                rows = rows.len(),
                "no seed column matches the table"
            );
        }
        return Batch::for_table(&table.name, Vec::new());
    }

    let chunk_size = (dialect.max_bind_params() / columns.len()).max(1);
    let toggle_identity = dialect.requires_identity_insert_toggle()
        && columns.iter().any(|column| column.auto_increment);

    let mut statements = Vec::new();
    if toggle_identity {
        statements.extend(dialect.identity_insert_sql(&table.name, true));
    }
    for chunk in rows.chunks(chunk_size) {
        let values = chunk
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        row.get(&column.name)
                            .and_then(|value| dialect.bind_value(column, value))
                    })
                    .collect()
            })
            .collect();
        statements.push(dialect.insert_sql(table, &columns, values));
    }
    if toggle_identity {
        statements.extend(dialect.identity_insert_sql(&table.name, false));
    }
    statements.extend(dialect.reset_sequences_sql(table, &columns));

    Batch::for_table(&table.name, statements)
}

/// Read the seed file at `path` and import it.
pub async fn import_seed_file<D>(
    db: &mut D,
    path: &Path,
    opts: &SeedImportOptions,
    progress: &dyn Progress,
) -> Result<Outcome>
where
    D: Database + ?Sized,
{
    let seed = read_seed(path)?;
    import_seed(db, &seed, opts, progress).await
}

/// Insert every seeded table in file order, truncating first when asked.
///
/// Truncation and insertion are two separate transactions, each with
/// foreign-key checking suspended.
pub async fn import_seed<D>(
    db: &mut D,
    seed: &SeedSet,
    opts: &SeedImportOptions,
    progress: &dyn Progress,
) -> Result<Outcome>
where
    D: Database + ?Sized,
{
    if seed.is_empty() {
        tracing::info!(event = "seed_imported", tables = 0, rows = 0);
        return Ok(Outcome::Completed(Summary::default()));
    }

    let mut live = Vec::with_capacity(seed.len());
    for name in seed.table_names() {
        live.push(db.describe(name).await?);
    }

    let order: Vec<&str> = seed.table_names().collect();
    for violation in forward_references(&live, &order) {
        tracing::warn!(
            event = "seed_order_violation",
            table = %violation.table,
            constraint = %violation.constraint,
            references = %violation.references,
            "seed table is inserted before a table it references"
        );
    }

    let mut statements = 0;
    if opts.truncate {
        let truncates: Vec<Batch> = {
            let dialect = db.dialect();
            order
                .iter()
                .map(|table| Batch::for_table(*table, vec![dialect.truncate_table_sql(table)]))
                .collect()
        };
        statements += run_phase(db, "truncate", &truncates, true, progress).await?;
    }

    let inserts: Vec<Batch> = {
        let dialect = db.dialect();
        live.iter()
            .zip(seed.tables())
            .map(|(table, (_, rows))| insert_batch(dialect, table, rows))
            .collect()
    };
    statements += run_phase(db, "seed", &inserts, true, progress).await?;

    let summary = Summary {
        tables: seed.len(),
        rows: seed.row_count(),
        statements,
    };
    tracing::info!(
        event = "seed_imported",
        tables = summary.tables,
        rows = summary.rows,
        statements
    );
    Ok(Outcome::Completed(summary))
}
