pub mod buffer_writer;


// Re-exports
pub use buffer_writer::{BufferWriter, PassContext, PassOutcome};

use crate::{WipeError, WipePhase, WipeResult};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Extension shared by every temp wipe file
pub const WIPE_FILE_EXTENSION: &str = "tmp";

/// Name of the `index`-th file written by `pass` during `phase`.
///
/// Zero-padded so lexical order matches write order.
pub fn wipe_file_name(phase: WipePhase, pass: usize, index: usize) -> String {
    format!(
        "{}{:06}.{}",
        pass_file_prefix(phase, pass),
        index,
        WIPE_FILE_EXTENSION
    )
}

/// Prefix shared by all files of one pass
pub fn pass_file_prefix(phase: WipePhase, pass: usize) -> String {
    format!("{}pass{:02}_", phase_file_prefix(phase), pass)
}

/// Prefix shared by all files of one phase
pub fn phase_file_prefix(phase: WipePhase) -> String {
    format!("wipe_p{}_", phase.number())
}

/// Whether a write/create/sync error means the storage cannot take more data.
///
/// These end a pass normally instead of failing it.
pub fn is_storage_exhausted(err: &io::Error) -> bool {
    if matches!(err.kind(), ErrorKind::StorageFull | ErrorKind::WriteZero) {
        return true;
    }

    match err.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::ENOSPC || code == libc::EDQUOT,
        #[cfg(windows)]
        Some(code) => {
            use winapi::shared::winerror::{ERROR_DISK_FULL, ERROR_HANDLE_DISK_FULL};
            code as u32 == ERROR_DISK_FULL || code as u32 == ERROR_HANDLE_DISK_FULL
        }
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}

/// Wipe files in `dir` whose names start with `prefix`, sorted by name, with sizes
pub fn list_wipe_files(dir: &Path, prefix: &str) -> io::Result<Vec<(PathBuf, u64)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }

        match entry.metadata() {
            Ok(meta) if meta.is_file() => files.push((entry.path(), meta.len())),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    file = %entry.path().display(),
                    error = %e,
                    "Skipping unreadable wipe file"
                );
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Delete every wipe file in `dir` starting with `prefix`; returns bytes released
pub fn remove_wipe_files(dir: &Path, prefix: &str) -> WipeResult<u64> {
    let files = list_wipe_files(dir, prefix).map_err(|source| WipeError::Reclaim {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut released = 0u64;
    for (path, size) in files {
        fs::remove_file(&path).map_err(|source| WipeError::Reclaim {
            path: path.clone(),
            source,
        })?;
        released += size;
    }

    Ok(released)
}
