//! Project locking.
//!
//! [`FileLocker`] takes an advisory exclusive lock on `<project>/.graft/lock`
//! so two graft processes never interleave metadata writes. The lock is
//! released when the returned [`ProjectLock`] drops.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::Path,
};

use fs2::FileExt;
use tracing::debug;

use graft_core::{
    application::{ApplicationError, STATE_DIR, ports::{ProjectLock, ProjectLocker}},
    error::GraftResult,
};

pub const LOCK_FILE: &str = "lock";

#[derive(Debug, Clone, Copy, Default)]
pub struct FileLocker;

impl FileLocker {
    pub fn new() -> Self {
        Self
    }
}

/// Unlocks on drop.
struct HeldLock(File);

impl Drop for HeldLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl ProjectLocker for FileLocker {
    fn lock(&self, project: &Path) -> GraftResult<ProjectLock> {
        let state_dir = project.join(STATE_DIR);
        fs::create_dir_all(&state_dir).map_err(|e| ApplicationError::FilesystemError {
            path: state_dir.clone(),
            reason: format!("Failed to create state directory: {e}"),
        })?;

        let lock_path = state_dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ApplicationError::FilesystemError {
                path: lock_path.clone(),
                reason: format!("Failed to open lock file: {e}"),
            })?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            debug!(error = %e, lock = %lock_path.display(), "Lock acquisition failed");
            return Err(ApplicationError::ProjectLocked {
                path: project.to_path_buf(),
            }
            .into());
        }

        // PID for whoever finds the lock held.
        let _ = file.set_len(0);
        let _ = writeln!(file, "{}", std::process::id());
        debug!(lock = %lock_path.display(), "Acquired project lock");

        Ok(ProjectLock::new(HeldLock(file)))
    }
}

/// Locks nothing. For tests and read-only callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocker;

impl ProjectLocker for NoopLocker {
    fn lock(&self, _project: &Path) -> GraftResult<ProjectLock> {
        Ok(ProjectLock::noop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::error::GraftError;
    use tempfile::TempDir;

    #[test]
    fn second_lock_fails_until_first_drops() {
        let project = TempDir::new().unwrap();
        let locker = FileLocker::new();

        let held = locker.lock(project.path()).unwrap();
        let err = locker.lock(project.path()).unwrap_err();
        assert!(matches!(
            err,
            GraftError::Application(ApplicationError::ProjectLocked { .. })
        ));

        drop(held);
        assert!(locker.lock(project.path()).is_ok());
    }

    #[test]
    fn lock_file_records_pid() {
        let project = TempDir::new().unwrap();
        let _held = FileLocker::new().lock(project.path()).unwrap();

        let pid = fs::read_to_string(project.path().join(STATE_DIR).join(LOCK_FILE)).unwrap();
        assert_eq!(pid.trim(), std::process::id().to_string());
    }
}
