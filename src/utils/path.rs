//! Lexical path containment.
//!
//! These helpers never touch the filesystem beyond reading the current
//! directory: relative paths are made absolute against it and `.`/`..`
//! components are folded away textually. Symlinks in the middle of a path are
//! not resolved, which matches how the copy engine compares source and
//! destination locations.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute and fold `.` and `..` components.
///
/// A `..` at the root stays at the root.
pub(crate) fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root or a prefix
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` is `ancestor` or lies somewhere below it.
///
/// Comparison is component-wise, so `/a/bc` is not inside `/a/b`.
pub(crate) fn is_within(ancestor: &Path, path: &Path) -> io::Result<bool> {
    Ok(resolve(path)?.starts_with(resolve(ancestor)?))
}

/// Absolute location a symlink at `link` with contents `target` points to.
///
/// Relative targets are interpreted against the directory holding the link,
/// the same way the OS follows them.
pub(crate) fn resolve_link_target(link: &Path, target: &Path) -> io::Result<PathBuf> {
    if target.is_absolute() {
        return Ok(normalize(target));
    }
    let base = link.parent().unwrap_or_else(|| Path::new(""));
    resolve(&base.join(target))
}
