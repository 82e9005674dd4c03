//! Source/destination validation run before an entry is copied.

use std::path::Path;

use crate::error::{Error, Result};
use crate::metadata::Stat;
use crate::utils::path;

/// Stat both ends and reject pairs that cannot be copied.
///
/// Returns the source snapshot and the destination snapshot, if anything
/// exists at `dest`. Both follow symlinks only when `dereference` is set.
pub(crate) fn check_paths(src: &Path, dest: &Path, dereference: bool) -> Result<(Stat, Option<Stat>)> {
    let src_stat = Stat::of(src, dereference)?;
    let dest_stat = Stat::of_optional(dest, dereference)?;

    if let Some(dest_stat) = &dest_stat {
        if src_stat.is_same_entry(dest_stat) {
            return Err(Error::SamePath(dest.to_path_buf()));
        }
        if src_stat.is_dir() && !dest_stat.is_dir() {
            return Err(Error::CannotOverwriteNonDirectory {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
            });
        }
        if !src_stat.is_dir() && dest_stat.is_dir() {
            return Err(Error::CannotOverwriteDirectory {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
            });
        }
    }

    if src_stat.is_dir() && path::is_within(src, dest)? {
        return Err(Error::SelfCopy {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }

    Ok((src_stat, dest_stat))
}

/// Walk up from `dest` and reject a destination nested under `src` through
/// some alias the lexical check cannot see (a symlinked parent, a bind mount).
///
/// Stops at `src`'s parent, at the root, or at the first ancestor that does
/// not exist yet.
pub(crate) fn check_parent_paths(src: &Path, src_stat: &Stat, dest: &Path) -> Result<()> {
    let src_parent = parent_of(&path::resolve(src)?);
    let mut current = path::resolve(dest)?;

    loop {
        let dest_parent = parent_of(&current);
        if dest_parent == src_parent || dest_parent.parent().is_none() {
            return Ok(());
        }

        let Some(parent_stat) = Stat::of_optional(&dest_parent, true)? else {
            return Ok(());
        };
        if src_stat.is_same_entry(&parent_stat) {
            return Err(Error::SelfCopy {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
            });
        }

        current = dest_parent;
    }
}

fn parent_of(path: &Path) -> std::path::PathBuf {
    path.parent().unwrap_or(path).to_path_buf()
}
