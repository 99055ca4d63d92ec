//! Advisory lock keeping two runs from rotating the same backup root.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;

/// Held for the duration of a run. The OS lock is released when this is
/// dropped; the lock file itself is left in place.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    pub fn lock_file_path<P: AsRef<Path>>(root: P, base_name: &str) -> PathBuf {
        root.as_ref().join(format!(".{base_name}-Backup.lock"))
    }

    pub fn acquire<P: AsRef<Path>>(root: P, base_name: &str) -> Result<Self> {
        let path = Self::lock_file_path(root, base_name);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| Error::RootLocked { path: path.clone() })?;
        debug!("Acquired lock {:?}", path);
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Releasing lock {:?} failed: {e}", self.path);
        }
    }
}
