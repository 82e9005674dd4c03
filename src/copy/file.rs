//! Regular and device file copies.

use std::fs::{self, File};
use std::path::Path;

use crate::error::{Error, Result};
use crate::metadata::{EntryKind, Stat};
use crate::options::CopyOptions;

use super::utils::{copy_file_contents, copy_stream, preserve_timestamps, set_dest_mode};

/// What happened to one file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileOutcome {
    /// Bytes were written to the destination
    Copied(u64),
    /// The destination existed and was left alone
    Skipped,
}

/// Copy one file entry according to the overwrite policy.
pub(crate) fn copy_file_entry(
    src: &Path,
    dest: &Path,
    src_stat: &Stat,
    dest_stat: Option<&Stat>,
    options: &CopyOptions,
) -> Result<FileOutcome> {
    if dest_stat.is_some() {
        if options.overwrites() {
            fs::remove_file(dest)?;
        } else if options.error_on_exist {
            return Err(Error::AlreadyExists(dest.to_path_buf()));
        } else {
            tracing::debug!("skipping existing {}", dest.display());
            return Ok(FileOutcome::Skipped);
        }
    }

    let bytes = write_copy(src, dest, src_stat)?;

    if options.preserve_timestamps {
        preserve_timestamps(src, dest, src_stat)?;
    }
    set_dest_mode(dest, src_stat)?;

    Ok(FileOutcome::Copied(bytes))
}

fn write_copy(src: &Path, dest: &Path, src_stat: &Stat) -> Result<u64> {
    let input = File::open(src)?;
    let output = File::create(dest)?;
    let bytes = if src_stat.kind == EntryKind::File {
        copy_file_contents(&input, &output, src_stat.len)?
    } else {
        copy_stream(&input, &output)?
    };
    Ok(bytes)
}
