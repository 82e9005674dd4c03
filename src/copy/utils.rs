//! Byte copying, mode and timestamp helpers for the copy engine.

use filetime::set_file_times;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::metadata::{self, Stat};

// =============================================================================
// File content copying
// =============================================================================

/// Copy `len` bytes of a regular file using the best available method.
///
/// On Linux this uses `copy_file_range` so the data never enters userspace,
/// falling back to `std::io::copy` when the filesystems involved refuse it.
pub(crate) fn copy_file_contents(src: &File, dst: &File, len: u64) -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        copy_file_range_all(src, dst, len)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = len;
        copy_stream(src, dst)
    }
}

/// Copy until EOF through a userspace buffer.
///
/// Used for device files, whose reported length is meaningless.
pub(crate) fn copy_stream(src: &File, dst: &File) -> io::Result<u64> {
    use std::io::BufReader;
    io::copy(&mut BufReader::new(src), &mut &*dst)
}

#[cfg(target_os = "linux")]
fn copy_file_range_all(src: &File, dst: &File, len: u64) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    const CHUNK: u64 = 128 * 1024 * 1024;

    let src_fd = src.as_raw_fd();
    let dst_fd = dst.as_raw_fd();
    let mut remaining = len;
    let mut copied: u64 = 0;

    while remaining > 0 {
        let chunk = usize::try_from(remaining.min(CHUNK)).unwrap_or(usize::MAX);

        // SAFETY: both descriptors are open for the lifetime of the borrows and
        // null offsets mean "use and advance the file position".
        let result = unsafe {
            libc::copy_file_range(
                src_fd,
                std::ptr::null_mut(),
                dst_fd,
                std::ptr::null_mut(),
                chunk,
                0,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            if copied == 0
                && matches!(
                    err.raw_os_error(),
                    Some(libc::EXDEV | libc::ENOSYS | libc::EINVAL | libc::EOPNOTSUPP)
                )
            {
                return copy_stream(src, dst);
            }
            return Err(err);
        }

        if result == 0 {
            // source shrank underneath us
            break;
        }

        let n = u64::try_from(result).unwrap_or(0);
        copied += n;
        remaining = remaining.saturating_sub(n);
    }

    Ok(copied)
}

// =============================================================================
// Metadata
// =============================================================================

/// Apply the permission bits of `src_stat` to `dest`.
pub(crate) fn set_dest_mode(dest: &Path, src_stat: &Stat) -> io::Result<()> {
    metadata::chmod(dest, src_stat.permission_bits())
}

/// Copy atime and mtime from `src` onto `dest`.
///
/// A read-only source gives a read-only destination only after this runs, so
/// the destination is made owner-writable first. The source is re-read: the
/// copy itself may have bumped its access time.
pub(crate) fn preserve_timestamps(src: &Path, dest: &Path, src_stat: &Stat) -> io::Result<()> {
    if src_stat.is_owner_read_only() {
        metadata::chmod(dest, src_stat.permission_bits() | 0o200)?;
    }
    let fresh = Stat::of(src, true)?;
    set_file_times(dest, fresh.atime, fresh.mtime)
}

// =============================================================================
// Symlinks
// =============================================================================

#[cfg(unix)]
pub(crate) use std::os::unix::fs::symlink;

#[cfg(not(unix))]
pub(crate) fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Symlinks not supported on this platform",
    ))
}
