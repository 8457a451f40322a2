use super::VolumeInfo;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use winapi::um::fileapi::GetDiskFreeSpaceExW;
use winapi::um::winnt::ULARGE_INTEGER;

pub(super) fn disk_free_space(path: &Path) -> std::io::Result<VolumeInfo> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();

    // SAFETY: ULARGE_INTEGER is a plain union of integers; zero is a valid value
    let mut available: ULARGE_INTEGER = unsafe { std::mem::zeroed() };
    let mut total: ULARGE_INTEGER = unsafe { std::mem::zeroed() };
    let mut free: ULARGE_INTEGER = unsafe { std::mem::zeroed() };

    // SAFETY: `wide` is NUL-terminated and the out pointers live for the call
    let ok = unsafe { GetDiskFreeSpaceExW(wide.as_ptr(), &mut available, &mut total, &mut free) };
    if ok == 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: QuadPart is the full 64-bit view of the union
    let (available, total) = unsafe { (*available.QuadPart(), *total.QuadPart()) };

    Ok(VolumeInfo {
        total_bytes: total,
        free_bytes: available,
    })
}
