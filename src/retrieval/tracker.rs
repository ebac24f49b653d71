//! Temporary directory tracking
//!
//! Every component that creates a temporary directory registers it through
//! [`TempDirTracker`] as soon as the directory exists, so a partially failed
//! retrieval still leaves nothing behind after cleanup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

/// Registers a temporary directory for later cleanup
pub trait TempDirTracker: Send + Sync {
    fn track_temp_dir(&self, path: &Path);
}

/// Lock-protected set of temporary directories shared by all workers
#[derive(Debug, Default)]
pub struct TempDirRegistry {
    dirs: Mutex<HashSet<PathBuf>>,
}

impl TempDirRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock only means another worker panicked mid-insert; the set
    /// itself is still usable.
    fn lock_dirs(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock_dirs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_dirs().is_empty()
    }

    /// Snapshot of the tracked directories, sorted
    pub fn tracked_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock_dirs().iter().cloned().collect();
        dirs.sort();
        dirs
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock_dirs().contains(path)
    }

    /// Deletes every tracked directory and clears the set.
    ///
    /// Deletion errors are logged and otherwise ignored. Calling this again
    /// afterwards is a no-op.
    pub fn cleanup(&self) {
        let dirs: Vec<PathBuf> = self.lock_dirs().drain().collect();
        if dirs.is_empty() {
            return;
        }

        debug!("Removing {} temporary directories", dirs.len());
        for dir in dirs {
            if !dir.exists() {
                continue;
            }
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to remove temporary directory {:?}: {}", dir, e);
            }
        }
    }
}

impl TempDirTracker for TempDirRegistry {
    fn track_temp_dir(&self, path: &Path) {
        debug!("Tracking temporary directory {:?}", path);
        self.lock_dirs().insert(path.to_path_buf());
    }
}

/// Last-resort cleanup when the registry goes away without an explicit cleanup.
/// Workers hold their own reference, so this cannot run while one is in flight.
impl Drop for TempDirRegistry {
    fn drop(&mut self) {
        self.cleanup();
    }
}
