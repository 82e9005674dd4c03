//! Symlink re-creation.
//!
//! Links are copied as links: the destination gets the same target text
//! unless `dereference` is set, in which case the target is made absolute.
//! Before an existing destination link is replaced, both targets are resolved
//! and compared so that the copy can neither write into its own source nor
//! unlink a directory it is still reading from.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::metadata::{EntryKind, Stat};
use crate::options::CopyOptions;
use crate::utils::path;

use super::utils::symlink;

/// Re-create the link at `src` as `dest`.
pub(crate) fn copy_link(
    src: &Path,
    dest: &Path,
    dest_stat: Option<&Stat>,
    options: &CopyOptions,
) -> Result<()> {
    let raw_src_target = fs::read_link(src)?;
    let src_target = if options.dereference {
        path::resolve_link_target(src, &raw_src_target)?
    } else {
        raw_src_target.clone()
    };

    let Some(dest_stat) = dest_stat else {
        symlink(&src_target, dest)?;
        return Ok(());
    };

    if dest_stat.kind != EntryKind::Symlink {
        return Err(Error::AlreadyExists(dest.to_path_buf()));
    }

    let resolved_src = path::resolve_link_target(src, &raw_src_target)?;
    let resolved_dest = path::resolve_link_target(dest, &fs::read_link(dest)?)?;

    if path::is_within(&resolved_src, &resolved_dest)? {
        return Err(Error::SelfCopy {
            src: resolved_src,
            dest: resolved_dest,
        });
    }

    if points_to_dir(dest)? && path::is_within(&resolved_dest, &resolved_src)? {
        return Err(Error::OverwriteConflict {
            src: resolved_src,
            dest: resolved_dest,
        });
    }

    fs::remove_file(dest)?;
    symlink(&src_target, dest)?;
    Ok(())
}

fn points_to_dir(link: &Path) -> Result<bool> {
    Ok(Stat::of_optional(link, true)?.is_some_and(|stat| stat.is_dir()))
}
