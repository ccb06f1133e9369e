use std::path::Path;

use schemalock_codec::write_snapshot;
use schemalock_core::{Result, Snapshot};

use crate::database::Database;
use crate::observer::Progress;

/// Introspect every existing table into a snapshot, in catalog order.
pub async fn capture_snapshot<D>(db: &mut D, progress: &dyn Progress) -> Result<Snapshot>
where
    D: Database + ?Sized,
{
    let mut snapshot = Snapshot::new();
    for name in db.list_tables().await? {
        let table = db.describe(&name).await?;
        snapshot.push(table)?;
        progress.on_table(&name);
    }
    Ok(snapshot)
}

/// Capture the live schema and atomically write it to `path`.
pub async fn save<D>(db: &mut D, path: &Path, progress: &dyn Progress) -> Result<Snapshot>
where
    D: Database + ?Sized,
{
    let snapshot = capture_snapshot(db, progress).await?;
    write_snapshot(path, &snapshot)?;
    tracing::info!(
        event = "snapshot_saved",
        path = %path.display(),
        tables = snapshot.len()
    );
    Ok(snapshot)
}
