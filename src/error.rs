//! Error types for gracefs.
//!
//! This module provides the [`Error`] enum containing all possible errors
//! raised by the copy engine and the metadata helpers, and the [`Result`]
//! type alias.
//!
//! # Error Categories
//!
//! | Category | Errors |
//! |----------|--------|
//! | IO | [`Error::Io`], [`Error::ResourceExhausted`] |
//! | Validation | [`Error::SamePath`], [`Error::CannotOverwriteDirectory`], [`Error::CannotOverwriteNonDirectory`] |
//! | Conflict | [`Error::AlreadyExists`], [`Error::OverwriteConflict`] |
//! | Safety | [`Error::SelfCopy`] |
//! | Entry type | [`Error::UnsupportedEntryType`], [`Error::UnknownEntryType`] |
//!
//! The retry layer never wraps errors: wrapped operations complete with the
//! raw [`std::io::Error`] they produced, so callers see exactly what the OS
//! reported.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for gracefs operations.
///
/// This is a type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Check if an IO error means the process or the system ran out of file
/// descriptors.
///
/// These are the only errors the retry queue recovers from.
///
/// # Platform Support
///
/// | Platform | Error Detection |
/// |----------|-----------------|
/// | Unix | `EMFILE` (per process), `ENFILE` (system wide) |
/// | Windows | `ERROR_TOO_MANY_OPEN_FILES` (4) |
///
/// # Example
///
/// ```
/// use std::io;
/// use gracefs::is_resource_exhausted;
///
/// let error = io::Error::new(io::ErrorKind::NotFound, "missing");
/// assert!(!is_resource_exhausted(&error));
/// ```
pub fn is_resource_exhausted(error: &io::Error) -> bool {
    let Some(raw_error) = error.raw_os_error() else {
        return false;
    };

    #[cfg(unix)]
    {
        raw_error == libc::EMFILE || raw_error == libc::ENFILE
    }

    #[cfg(windows)]
    {
        const ERROR_TOO_MANY_OPEN_FILES: i32 = 4;
        raw_error == ERROR_TOO_MANY_OPEN_FILES
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = raw_error;
        false
    }
}

/// Errors that can occur during copy and metadata operations.
///
/// All errors include relevant path information to aid debugging.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// IO error passed through unchanged
    #[error("IO error: {0}")]
    Io(io::Error),

    /// The OS ran out of file descriptors
    ///
    /// The copy engine does not retry; operations that should survive this
    /// condition go through [`GracefulFs`](crate::GracefulFs) instead.
    #[error("Too many open files: {0}")]
    ResourceExhausted(io::Error),

    /// Destination already exists and the options forbid replacing it
    #[error("Destination already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Source and destination resolve to the same filesystem entry
    #[error("Source and destination must not be the same: {0}")]
    SamePath(PathBuf),

    /// Copying would place the destination inside the source
    #[error("Cannot copy '{src}' to a subdirectory of itself, '{dest}'")]
    SelfCopy {
        /// Source path (or resolved link target)
        src: PathBuf,
        /// Destination path (or resolved link target)
        dest: PathBuf,
    },

    /// Replacing the destination link would destroy data the copy still reads
    #[error("Cannot overwrite '{dest}' with '{src}'")]
    OverwriteConflict {
        /// Resolved target of the source link
        src: PathBuf,
        /// Resolved target of the existing destination link
        dest: PathBuf,
    },

    /// Source is a directory and the destination an existing non-directory
    #[error("Cannot overwrite non-directory '{dest}' with directory '{src}'")]
    CannotOverwriteNonDirectory {
        /// Source directory
        src: PathBuf,
        /// Existing destination
        dest: PathBuf,
    },

    /// Source is a non-directory and the destination an existing directory
    #[error("Cannot overwrite directory '{dest}' with non-directory '{src}'")]
    CannotOverwriteDirectory {
        /// Source entry
        src: PathBuf,
        /// Existing destination directory
        dest: PathBuf,
    },

    /// Sockets and named pipes cannot be copied
    #[error("Cannot copy a {kind}: {path}")]
    UnsupportedEntryType {
        /// Offending source path
        path: PathBuf,
        /// Human readable entry kind ("socket" or "FIFO pipe")
        kind: &'static str,
    },

    /// The OS reported an entry type gracefs does not recognize
    #[error("Unknown file: {0}")]
    UnknownEntryType(PathBuf),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        if is_resource_exhausted(&error) {
            Error::ResourceExhausted(error)
        } else {
            Error::Io(error)
        }
    }
}

impl Error {
    /// Short, stable identifier for the error kind.
    ///
    /// Used by the command line front end when printing `error[<code>]`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "io_error",
            Error::ResourceExhausted(_) => "resource_exhausted",
            Error::AlreadyExists(_) => "already_exists",
            Error::SamePath(_) => "same_path",
            Error::SelfCopy { .. } => "self_copy",
            Error::OverwriteConflict { .. } => "overwrite_conflict",
            Error::CannotOverwriteNonDirectory { .. }
            | Error::CannotOverwriteDirectory { .. } => "type_mismatch",
            Error::UnsupportedEntryType { .. } => "unsupported_entry_type",
            Error::UnknownEntryType(_) => "unknown_entry_type",
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_is_resource_exhausted_emfile() {
        let error = io::Error::from_raw_os_error(libc::EMFILE);
        assert!(is_resource_exhausted(&error));
    }

    #[test]
    fn test_is_resource_exhausted_enfile() {
        let error = io::Error::from_raw_os_error(libc::ENFILE);
        assert!(is_resource_exhausted(&error));
    }

    #[test]
    fn test_is_resource_exhausted_other_errno() {
        let error = io::Error::from_raw_os_error(libc::ENOENT);
        assert!(!is_resource_exhausted(&error));
    }

    #[test]
    fn test_is_resource_exhausted_without_os_code() {
        let error = io::Error::other("too many open files");
        assert!(!is_resource_exhausted(&error));
    }

    #[test]
    fn test_from_io_routes_exhaustion() {
        let error: Error = io::Error::from_raw_os_error(libc::EMFILE).into();
        assert!(matches!(error, Error::ResourceExhausted(_)));
        assert_eq!(error.code(), "resource_exhausted");

        let error: Error = io::Error::from_raw_os_error(libc::EACCES).into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_self_copy_display() {
        let error = Error::SelfCopy {
            src: PathBuf::from("/data"),
            dest: PathBuf::from("/data/backup"),
        };
        let msg = error.to_string();
        assert!(msg.contains("subdirectory of itself"));
        assert!(msg.contains("/data/backup"));
    }
}
