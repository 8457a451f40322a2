use super::VolumeInfo;
use nix::sys::statvfs::statvfs;
use std::path::Path;

// Field widths differ between unix targets
#[allow(clippy::unnecessary_cast)]
pub(super) fn statvfs_info(path: &Path) -> std::io::Result<VolumeInfo> {
    let stat = statvfs(path).map_err(std::io::Error::from)?;

    // f_frsize is the allocation unit the block counts are expressed in
    let unit = match stat.fragment_size() as u64 {
        0 => stat.block_size() as u64,
        frsize => frsize,
    };

    Ok(VolumeInfo {
        total_bytes: (stat.blocks() as u64).saturating_mul(unit),
        free_bytes: (stat.blocks_available() as u64).saturating_mul(unit),
    })
}
