//! Single-instance guard for ingest runs
//!
//! Two concurrent ingest jobs would interleave deletes and upserts for the
//! same sources, so the whole run holds an exclusive advisory file lock.

use std::fs::{File, OpenOptions};

use fs2::FileExt;

use crate::config::INGEST_LOCK_FILE;
use crate::error::{Error, Result};

/// Lock guard that ensures exclusive access to the vector index during ingest.
pub struct IngestLock {
    lock_file: Option<File>,
    path: String,
}

impl IngestLock {
    /// Acquire an exclusive lock using the default lock file.
    pub fn acquire() -> Result<Self> {
        Self::acquire_at(INGEST_LOCK_FILE)
    }

    /// Acquire an exclusive lock at a specific path.
    pub fn acquire_at(path: &str) -> Result<Self> {
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::LockError(format!("Failed to open lock file: {}", e)))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                lock_file: Some(lock_file),
                path: path.to_string(),
            }),
            Err(_) => {
                eprintln!(
                    "Another ingest run is already in progress. \
                     Wait for it to finish and try again."
                );
                Err(Error::IngestLocked)
            }
        }
    }

    /// Release the lock manually
    pub fn release(&mut self) {
        if let Some(ref file) = self.lock_file {
            let _ = fs2::FileExt::unlock(file);
        }
        self.lock_file = None;
        let _ = std::fs::remove_file(&self.path);
    }
}

impl Drop for IngestLock {
    fn drop(&mut self) {
        self.release();
    }
}
