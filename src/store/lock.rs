use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Lock file guarding a mapping file, e.g. `tm2bd-map.json.lock`.
pub fn lock_path_for(mapping_path: &Path) -> PathBuf {
    let mut name = OsString::from(mapping_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Acquire an exclusive lock on a file, returning the locked File handle.
/// The lock is released when the File is dropped.
pub fn acquire_lock(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    file.try_lock_exclusive()
        .map_err(|_| SyncError::Locked(path.display().to_string()))?;

    Ok(file)
}

/// Release lock explicitly (normally handled by Drop).
pub fn release_lock(file: File) -> Result<()> {
    file.unlock()?;
    Ok(())
}

/// Held for the length of a sync run. Dropping it unlocks and removes the
/// lock file.
#[derive(Debug)]
pub struct MappingLock {
    path: PathBuf,
    file: Option<File>,
}

impl MappingLock {
    pub fn acquire(mapping_path: &Path) -> Result<Self> {
        let path = lock_path_for(mapping_path);
        let file = acquire_lock(&path)?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MappingLock {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        // Unlink before unlocking.
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), %err, "could not remove lock file");
        }
        if let Err(err) = release_lock(file) {
            tracing::debug!(path = %self.path.display(), %err, "could not release lock");
        }
    }
}
