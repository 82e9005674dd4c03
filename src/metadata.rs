//! Metadata snapshots and best-effort ownership/permission changes.
//!
//! [`Stat`] is a read-only view of one entry taken straight from the OS. It
//! is never cached: the copy engine takes a fresh one for every entry it
//! visits.
//!
//! `chmod`, `chown` and `lchown` follow a best-effort policy: failures that
//! are expected for unprivileged callers or unsupported platforms are
//! reported as success.

use filetime::FileTime;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

/// Filesystem classification of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (only seen when not following links)
    Symlink,
    /// Character device
    CharDevice,
    /// Block device
    BlockDevice,
    /// Unix domain socket
    Socket,
    /// Named pipe
    Fifo,
    /// Anything the OS reports that is none of the above
    Unknown,
}

impl EntryKind {
    fn of(metadata: &Metadata) -> Self {
        let ft = metadata.file_type();
        if ft.is_symlink() {
            return EntryKind::Symlink;
        }
        if ft.is_dir() {
            return EntryKind::Directory;
        }
        if ft.is_file() {
            return EntryKind::File;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_char_device() {
                return EntryKind::CharDevice;
            }
            if ft.is_block_device() {
                return EntryKind::BlockDevice;
            }
            if ft.is_socket() {
                return EntryKind::Socket;
            }
            if ft.is_fifo() {
                return EntryKind::Fifo;
            }
        }

        EntryKind::Unknown
    }
}

/// Snapshot of one entry's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Entry type
    pub kind: EntryKind,
    /// Full mode bits including the type bits (0 where unsupported)
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Device id of the containing filesystem
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// Length in bytes
    pub len: u64,
    /// Last access time
    pub atime: FileTime,
    /// Last modification time
    pub mtime: FileTime,
}

impl Stat {
    /// Stat `path`, following symlinks when `follow` is set.
    pub fn of(path: &Path, follow: bool) -> io::Result<Self> {
        let metadata = if follow {
            fs::metadata(path)?
        } else {
            fs::symlink_metadata(path)?
        };
        Ok(Self::from_metadata(&metadata))
    }

    /// Stat `path`, returning `None` when nothing exists there.
    pub fn of_optional(path: &Path, follow: bool) -> io::Result<Option<Self>> {
        match Self::of(path, follow) {
            Ok(stat) => Ok(Some(stat)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Build a snapshot from std metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let atime = FileTime::from_last_access_time(metadata);
        let mtime = FileTime::from_last_modification_time(metadata);

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Self {
                kind: EntryKind::of(metadata),
                mode: metadata.mode(),
                uid: metadata.uid(),
                gid: metadata.gid(),
                dev: metadata.dev(),
                ino: metadata.ino(),
                len: metadata.len(),
                atime,
                mtime,
            }
        }

        #[cfg(not(unix))]
        {
            Self {
                kind: EntryKind::of(metadata),
                mode: if metadata.permissions().readonly() {
                    0o444
                } else {
                    0o666
                },
                uid: 0,
                gid: 0,
                dev: 0,
                ino: 0,
                len: metadata.len(),
                atime,
                mtime,
            }
        }
    }

    /// Whether both snapshots describe the same filesystem entry.
    ///
    /// Requires non-zero inode and device numbers; platforms that report
    /// zeros never compare identical.
    pub fn is_same_entry(&self, other: &Stat) -> bool {
        self.ino != 0 && self.dev != 0 && self.ino == other.ino && self.dev == other.dev
    }

    /// Permission bits without the type bits.
    pub fn permission_bits(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Whether the owner write bit is clear.
    pub fn is_owner_read_only(&self) -> bool {
        self.mode & 0o200 == 0
    }

    /// Whether this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Map an owner id reported as a signed value onto its unsigned meaning.
///
/// Some hosts hand ids above `i32::MAX` back as negative numbers; adding
/// 2^32 recovers the real id. [`Stat`] reads ids through the unsigned
/// `MetadataExt` accessors and never needs this; it is for ids that arrive
/// from elsewhere as signed integers.
pub fn normalize_id(raw: i64) -> u32 {
    let id = if raw < 0 { raw + (1_i64 << 32) } else { raw };
    u32::try_from(id).unwrap_or(u32::MAX)
}

// =============================================================================
// Best-effort permission and ownership changes
// =============================================================================

/// Whether an ownership/permission error should be reported as success.
///
/// `ENOSYS` always is. `EINVAL` and `EPERM` are when not running as root,
/// since unprivileged callers routinely cannot give files away.
pub fn is_ignorable_owner_error(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        match error.raw_os_error() {
            Some(code) if code == libc::ENOSYS => true,
            Some(code) if code == libc::EINVAL || code == libc::EPERM => !is_root(),
            _ => false,
        }
    }

    #[cfg(not(unix))]
    {
        error.kind() == io::ErrorKind::Unsupported
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

fn best_effort(result: io::Result<()>, op: &'static str, path: &Path) -> io::Result<()> {
    match result {
        Err(e) if is_ignorable_owner_error(&e) => {
            tracing::debug!("ignoring {op} failure on {}: {e}", path.display());
            Ok(())
        }
        other => other,
    }
}

/// Change permission bits, tolerating expected unprivileged failures.
pub fn chmod(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    let result = {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    };

    #[cfg(not(unix))]
    let result = fs::metadata(path).and_then(|m| {
        let mut perms = m.permissions();
        perms.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(path, perms)
    });

    best_effort(result, "chmod", path)
}

/// Change ownership following symlinks, tolerating expected failures.
///
/// `None` leaves the corresponding id unchanged.
#[cfg(unix)]
pub fn chown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
    best_effort(std::os::unix::fs::chown(path, uid, gid), "chown", path)
}

/// Change ownership of a symlink itself, tolerating expected failures.
#[cfg(unix)]
pub fn lchown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
    best_effort(std::os::unix::fs::lchown(path, uid, gid), "lchown", path)
}
