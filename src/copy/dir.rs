//! Tree walk driving the per-entry copies.
//!
//! The walk keeps an explicit stack of steps instead of recursing, so the
//! depth of the source tree is bounded only by memory. Directory modes are
//! applied by a `FinishDir` step that sits below the directory's children on
//! the stack; a read-only source directory therefore stays writable at the
//! destination until everything inside it has been copied.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::metadata::{self, EntryKind, Stat};
use crate::options::CopyOptions;

use super::check::{check_parent_paths, check_paths};
use super::file::{FileOutcome, copy_file_entry};
use super::link::copy_link;

/// Statistics from a copy operation.
///
/// # Example
///
/// ```no_run
/// use gracefs::{copy, CopyOptions};
/// use std::path::Path;
///
/// let stats = copy(Path::new("src"), Path::new("dst"), &CopyOptions::default())?;
/// println!("Copied {} files ({} bytes)", stats.files_copied, stats.bytes_copied);
/// println!("Skipped {} files", stats.files_skipped);
/// # Ok::<(), gracefs::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CopyStats {
    /// Files (including device files) whose bytes were copied
    pub files_copied: u64,
    /// Files left alone because the destination existed
    pub files_skipped: u64,
    /// Directories created at the destination
    pub dirs_created: u64,
    /// Symlinks created or replaced
    pub symlinks_copied: u64,
    /// Entries the filter rejected (a rejected directory counts once)
    pub entries_filtered: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Wall time of the whole run
    pub duration: Duration,
}

/// One unit of work on the stack.
enum Step {
    /// Filter, validate and copy one child entry
    Visit { src: PathBuf, dest: PathBuf },
    /// Apply the source directory's mode once its children are done
    FinishDir { dest: PathBuf, mode: u32 },
}

/// A validated entry ready to be copied.
struct Task {
    src: PathBuf,
    dest: PathBuf,
    src_stat: Stat,
    dest_stat: Option<Stat>,
}

/// Copy `src` to `dest`, recursing into directories.
///
/// Missing parents of `dest` are created. The run stops at the first error
/// and leaves whatever was already copied in place.
///
/// # Errors
///
/// Returns an error if:
/// - `src` cannot be stat'ed ([`Error::Io`])
/// - `src` and `dest` are the same entry ([`Error::SamePath`])
/// - a directory would replace a non-directory or the reverse
///   ([`Error::CannotOverwriteNonDirectory`], [`Error::CannotOverwriteDirectory`])
/// - `dest` lies inside `src` ([`Error::SelfCopy`])
/// - a file exists and `error_on_exist` is set without overwrite
///   ([`Error::AlreadyExists`])
/// - replacing a destination link would clobber the link's own source
///   ([`Error::SelfCopy`], [`Error::OverwriteConflict`])
/// - the tree holds a socket, FIFO or unknown entry
///   ([`Error::UnsupportedEntryType`], [`Error::UnknownEntryType`])
pub fn copy(src: &Path, dest: &Path, options: &CopyOptions) -> Result<CopyStats> {
    let start = Instant::now();

    let (src_stat, dest_stat) = check_paths(src, dest, options.dereference)?;
    check_parent_paths(src, &src_stat, dest)?;

    let mut walk = Walk::new(options);

    if !options.allows(src, dest) {
        tracing::debug!("filter rejected {}", src.display());
        walk.stats.entries_filtered += 1;
        walk.stats.duration = start.elapsed();
        return Ok(walk.stats);
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    walk.dispatch(Task {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        src_stat,
        dest_stat,
    })?;
    walk.run()?;

    walk.stats.duration = start.elapsed();
    tracing::debug!(
        files = walk.stats.files_copied,
        dirs = walk.stats.dirs_created,
        links = walk.stats.symlinks_copied,
        bytes = walk.stats.bytes_copied,
        "copied {} to {}",
        src.display(),
        dest.display()
    );
    Ok(walk.stats)
}

struct Walk<'a> {
    options: &'a CopyOptions,
    stack: Vec<Step>,
    stats: CopyStats,
}

impl<'a> Walk<'a> {
    fn new(options: &'a CopyOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            stats: CopyStats::default(),
        }
    }

    fn run(&mut self) -> Result<()> {
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Visit { src, dest } => self.visit(src, dest)?,
                Step::FinishDir { dest, mode } => metadata::chmod(&dest, mode)?,
            }
        }
        Ok(())
    }

    fn visit(&mut self, src: PathBuf, dest: PathBuf) -> Result<()> {
        if !self.options.allows(&src, &dest) {
            tracing::trace!("filter rejected {}", src.display());
            self.stats.entries_filtered += 1;
            return Ok(());
        }

        let (src_stat, dest_stat) = check_paths(&src, &dest, self.options.dereference)?;
        self.dispatch(Task {
            src,
            dest,
            src_stat,
            dest_stat,
        })
    }

    fn dispatch(&mut self, task: Task) -> Result<()> {
        match task.src_stat.kind {
            EntryKind::Directory => self.on_dir(task),
            EntryKind::File | EntryKind::CharDevice | EntryKind::BlockDevice => {
                self.on_file(&task)
            }
            EntryKind::Symlink => {
                copy_link(&task.src, &task.dest, task.dest_stat.as_ref(), self.options)?;
                self.stats.symlinks_copied += 1;
                Ok(())
            }
            EntryKind::Socket => Err(Error::UnsupportedEntryType {
                path: task.src,
                kind: "socket",
            }),
            EntryKind::Fifo => Err(Error::UnsupportedEntryType {
                path: task.src,
                kind: "FIFO pipe",
            }),
            EntryKind::Unknown => Err(Error::UnknownEntryType(task.src)),
        }
    }

    fn on_file(&mut self, task: &Task) -> Result<()> {
        match copy_file_entry(
            &task.src,
            &task.dest,
            &task.src_stat,
            task.dest_stat.as_ref(),
            self.options,
        )? {
            FileOutcome::Copied(bytes) => {
                self.stats.files_copied += 1;
                self.stats.bytes_copied += bytes;
            }
            FileOutcome::Skipped => self.stats.files_skipped += 1,
        }
        Ok(())
    }

    fn on_dir(&mut self, task: Task) -> Result<()> {
        if task.dest_stat.is_none() {
            fs::create_dir(&task.dest)?;
            self.stats.dirs_created += 1;
            self.stack.push(Step::FinishDir {
                dest: task.dest.clone(),
                mode: task.src_stat.permission_bits(),
            });
        }

        let names = fs::read_dir(&task.src)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<Vec<_>>>()?;

        // Reverse so the first listed name is popped first
        for name in names.into_iter().rev() {
            self.stack.push(Step::Visit {
                src: task.src.join(&name),
                dest: task.dest.join(&name),
            });
        }
        Ok(())
    }
}
