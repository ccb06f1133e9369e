use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use schemalock_core::{Error, Result};
use uuid::Uuid;

/// Replace `path` with `data` so that readers see the old or the new file, never a torn one.
///
/// The data goes to a temp file next to `path`, is fsynced, and renamed over
/// the target; the directory is fsynced after the rename.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }

    let tmp_path = temp_path(path)?;
    if let Err(err) = write_temp(&tmp_path, data) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::io(&tmp_path, err));
    }

    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::io(path, err));
    }

    if let Some(parent) = parent {
        if let Err(err) = sync_dir(parent) {
            tracing::debug!(event = "dir_sync_skipped", path = %parent.display(), error = %err);
        }
    }

    Ok(())
}

fn write_temp(tmp_path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(tmp_path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let tmp_name = format!(".{}.{}.tmp", file_name.to_string_lossy(), Uuid::new_v4());
    Ok(path.with_file_name(tmp_name))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}
