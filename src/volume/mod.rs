// Volume information - total/free bytes for the volume holding a path
//
// One native implementation is compiled per target host; the trait is the seam
// the wiper uses so other providers can be substituted.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use crate::{WipeError, WipeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Space accounting for a volume, in bytes, after allocation-unit rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub total_bytes: u64,
    /// Bytes available to this (unprivileged) process
    pub free_bytes: u64,
}

impl VolumeInfo {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.free_bytes)
    }

    /// Percentage of the volume currently free (0-100)
    pub fn free_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.free_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait VolumeInfoProvider: Send + Sync {
    /// Query total and free bytes for the volume containing `path`
    fn query(&self, path: &Path) -> WipeResult<VolumeInfo>;
}

/// Host filesystem statistics (statvfs on unix, GetDiskFreeSpaceExW on Windows)
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeVolumeInfo;

impl VolumeInfoProvider for NativeVolumeInfo {
    fn query(&self, path: &Path) -> WipeResult<VolumeInfo> {
        query_native(path).map_err(|source| WipeError::VolumeQuery {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(unix)]
fn query_native(path: &Path) -> std::io::Result<VolumeInfo> {
    unix::statvfs_info(path)
}

#[cfg(windows)]
fn query_native(path: &Path) -> std::io::Result<VolumeInfo> {
    windows::disk_free_space(path)
}

#[cfg(not(any(unix, windows)))]
fn query_native(_path: &Path) -> std::io::Result<VolumeInfo> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "volume statistics are not supported on this platform",
    ))
}
