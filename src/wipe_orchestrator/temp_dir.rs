// Exclusive temporary working directory under the volume root

use crate::{WipeError, WipeResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Owns the temp directory for one wipe; removes it on `remove` or drop
#[derive(Debug)]
pub(crate) struct TempDirGuard {
    path: PathBuf,
    removed: bool,
}

impl TempDirGuard {
    /// Create `path`, failing with `TempDirInUse` if it already exists
    pub(crate) fn create(path: PathBuf) -> WipeResult<Self> {
        match fs::create_dir(&path) {
            Ok(()) => {
                tracing::debug!(dir = %path.display(), "Created temporary wipe directory");
                Ok(Self {
                    path,
                    removed: false,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(WipeError::TempDirInUse(path)),
            Err(source) => Err(WipeError::TempDirCreate { path, source }),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory and everything in it
    pub(crate) fn remove(mut self) -> WipeResult<()> {
        self.removed = true;
        remove_dir_if_present(&self.path)
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_dir_if_present(&self.path) {
            tracing::warn!(
                dir = %self.path.display(),
                error = %e,
                "Failed to remove temporary wipe directory"
            );
        }
    }
}

/// Recursively remove `path`; a directory that is already gone is not an error
pub(crate) fn remove_dir_if_present(path: &Path) -> WipeResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!(dir = %path.display(), "Removed temporary wipe directory");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(WipeError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}
