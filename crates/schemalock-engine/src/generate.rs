use std::path::Path;

use schemalock_codec::{read_snapshot, write_seed};
use schemalock_core::value::normalize_temporal;
use schemalock_core::{Result, Row, SeedSet, Snapshot, TableSchema};

use crate::database::{Database, RowQuery};
use crate::observer::Progress;
use crate::options::GenerateOptions;

fn normalize_row(table: &TableSchema, row: Row) -> Row {
    row.into_iter()
        .map(|(name, value)| {
            let value = match table.column(&name) {
                Some(column) if column.column_type.is_temporal() => {
                    normalize_temporal(&column.column_type, value)
                }
                _ => value,
            };
            (name, value)
        })
        .collect()
}

/// Fetch seed rows for every snapshot table that is not excluded.
///
/// Tables without matching rows are left out of the result.
pub async fn generate_seed<D>(
    db: &mut D,
    snapshot: &Snapshot,
    opts: &GenerateOptions,
    progress: &dyn Progress,
) -> Result<SeedSet>
where
    D: Database + ?Sized,
{
    let query = RowQuery {
        limit: opts.record_limit,
        filter: opts.filter.clone(),
    };

    let mut seed = SeedSet::new();
    for table in snapshot.tables() {
        if opts.is_excluded(&table.name) {
            tracing::debug!(event = "seed_table_excluded", table = %table.name);
            continue;
        }

        let rows = db.fetch_rows(table, &query).await?;
        progress.on_table(&table.name);
        if rows.is_empty() {
            tracing::debug!(event = "seed_table_empty", table = %table.name);
            continue;
        }

        let rows = rows.into_iter().map(|row| normalize_row(table, row)).collect();
        seed.push(table.name.clone(), rows);
    }
    Ok(seed)
}

/// Generate seed data for the snapshot at `snapshot_path` and write it to `seed_path`.
pub async fn write_generated_seed<D>(
    db: &mut D,
    snapshot_path: &Path,
    seed_path: &Path,
    opts: &GenerateOptions,
    progress: &dyn Progress,
) -> Result<SeedSet>
where
    D: Database + ?Sized,
{
    let snapshot = read_snapshot(snapshot_path)?;
    let seed = generate_seed(db, &snapshot, opts, progress).await?;
    write_seed(seed_path, &seed)?;
    tracing::info!(
        event = "seed_generated",
        path = %seed_path.display(),
        tables = seed.len(),
        rows = seed.row_count()
    );
    Ok(seed)
}
