//! Filesystem facade whose descriptor-hungry calls ride out exhaustion.
//!
//! [`GracefulFs`] applies the retry wrapper to the operations that open a
//! descriptor:
//!
//! | Operation | Retried | Result |
//! |-----------|---------|--------|
//! | [`open`](GracefulFs::open) | yes | [`File`] |
//! | [`read_file`](GracefulFs::read_file) | yes | file contents |
//! | [`write_file`](GracefulFs::write_file) | yes | `()` |
//! | [`append_file`](GracefulFs::append_file) | yes | `()` |
//! | [`read_dir`](GracefulFs::read_dir) | yes | sorted entry names |
//! | [`stat`](GracefulFs::stat), [`lstat`](GracefulFs::lstat) | no | [`Stat`] |
//! | [`chmod`](GracefulFs::chmod), [`chown`](GracefulFs::chown), [`lchown`](GracefulFs::lchown) | no | best effort |
//!
//! Each retried operation has a callback form and an `_async` form returning
//! a [`Pending`] future. Releasing a descriptor through
//! [`close`](GracefulFs::close) resets the queue, giving everything parked in
//! it a fresh deadline.
//!
//! # Example
//!
//! ```no_run
//! use gracefs::GracefulFs;
//!
//! let fs = GracefulFs::default();
//! fs.read_file("Cargo.toml", |result| match result {
//!     Ok(bytes) => println!("{} bytes", bytes.len()),
//!     Err(e) => eprintln!("read failed: {e}"),
//! });
//!
//! let names = futures::executor::block_on(fs.read_dir_async("."))?;
//! println!("{names:?}");
//! # Ok::<(), std::io::Error>(())
//! ```

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::metadata::{self, Stat};
use crate::retry::{Pending, RetryQueue, Retrying};
use crate::trace;

type Contents = Arc<[u8]>;

/// Retrying wrappers around descriptor-opening filesystem calls.
#[derive(Clone)]
pub struct GracefulFs {
    queue: RetryQueue,
    open: Retrying<(PathBuf, OpenOptions), File>,
    read_file: Retrying<PathBuf, Vec<u8>>,
    write_file: Retrying<(PathBuf, Contents), ()>,
    append_file: Retrying<(PathBuf, Contents), ()>,
    read_dir: Retrying<PathBuf, Vec<OsString>>,
}

impl GracefulFs {
    /// Wrap the filesystem calls on `queue`.
    pub fn new(queue: RetryQueue) -> Self {
        let open = queue.wrap_sync("open", |(path, options): (PathBuf, OpenOptions)| {
            options.open(path)
        });
        let read_file = queue.wrap_sync("read_file", |path: PathBuf| fs::read(path));
        let write_file = queue.wrap_sync("write_file", |(path, contents): (PathBuf, Contents)| {
            fs::write(path, &contents)
        });
        let append_file =
            queue.wrap_sync("append_file", |(path, contents): (PathBuf, Contents)| {
                OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)?
                    .write_all(&contents)
            });
        let read_dir = queue.wrap_sync("read_dir", |path: PathBuf| list_dir(&path));

        for name in [
            open.name(),
            read_file.name(),
            write_file.name(),
            append_file.name(),
            read_dir.name(),
        ] {
            trace::event!("wrap", op = name);
        }

        Self {
            queue,
            open,
            read_file,
            write_file,
            append_file,
            read_dir,
        }
    }

    /// The queue failed calls are parked in.
    pub fn queue(&self) -> &RetryQueue {
        &self.queue
    }

    // =========================================================================
    // Retried operations
    // =========================================================================

    /// Open `path` with `options`.
    pub fn open<P, F>(&self, path: P, options: &OpenOptions, done: F)
    where
        P: AsRef<Path>,
        F: FnOnce(io::Result<File>) + Send + 'static,
    {
        self.open
            .call((path.as_ref().to_path_buf(), options.clone()), done);
    }

    /// Open `path` with `options`, awaiting the result.
    pub fn open_async<P: AsRef<Path>>(&self, path: P, options: &OpenOptions) -> Pending<File> {
        self.open
            .call_async((path.as_ref().to_path_buf(), options.clone()))
    }

    /// Read a whole file.
    pub fn read_file<P, F>(&self, path: P, done: F)
    where
        P: AsRef<Path>,
        F: FnOnce(io::Result<Vec<u8>>) + Send + 'static,
    {
        self.read_file.call(path.as_ref().to_path_buf(), done);
    }

    /// Read a whole file, awaiting the result.
    pub fn read_file_async<P: AsRef<Path>>(&self, path: P) -> Pending<Vec<u8>> {
        self.read_file.call_async(path.as_ref().to_path_buf())
    }

    /// Create or truncate `path` and write `contents` to it.
    pub fn write_file<P, C, F>(&self, path: P, contents: C, done: F)
    where
        P: AsRef<Path>,
        C: AsRef<[u8]>,
        F: FnOnce(io::Result<()>) + Send + 'static,
    {
        self.write_file
            .call((path.as_ref().to_path_buf(), contents.as_ref().into()), done);
    }

    /// Create or truncate `path` and write `contents`, awaiting the result.
    pub fn write_file_async<P: AsRef<Path>, C: AsRef<[u8]>>(
        &self,
        path: P,
        contents: C,
    ) -> Pending<()> {
        self.write_file
            .call_async((path.as_ref().to_path_buf(), contents.as_ref().into()))
    }

    /// Append `contents` to `path`, creating it if needed.
    pub fn append_file<P, C, F>(&self, path: P, contents: C, done: F)
    where
        P: AsRef<Path>,
        C: AsRef<[u8]>,
        F: FnOnce(io::Result<()>) + Send + 'static,
    {
        self.append_file
            .call((path.as_ref().to_path_buf(), contents.as_ref().into()), done);
    }

    /// Append `contents` to `path`, awaiting the result.
    pub fn append_file_async<P: AsRef<Path>, C: AsRef<[u8]>>(
        &self,
        path: P,
        contents: C,
    ) -> Pending<()> {
        self.append_file
            .call_async((path.as_ref().to_path_buf(), contents.as_ref().into()))
    }

    /// List the names in a directory, sorted.
    pub fn read_dir<P, F>(&self, path: P, done: F)
    where
        P: AsRef<Path>,
        F: FnOnce(io::Result<Vec<OsString>>) + Send + 'static,
    {
        self.read_dir.call(path.as_ref().to_path_buf(), done);
    }

    /// List the names in a directory, awaiting the result.
    pub fn read_dir_async<P: AsRef<Path>>(&self, path: P) -> Pending<Vec<OsString>> {
        self.read_dir.call_async(path.as_ref().to_path_buf())
    }

    /// Release a descriptor and give queued calls a fresh start.
    pub fn close(&self, file: File) {
        drop(file);
        self.queue.reset();
    }

    // =========================================================================
    // Pass-through metadata
    // =========================================================================

    /// Stat following symlinks.
    pub fn stat<P: AsRef<Path>>(&self, path: P) -> io::Result<Stat> {
        Stat::of(path.as_ref(), true)
    }

    /// Stat without following symlinks.
    pub fn lstat<P: AsRef<Path>>(&self, path: P) -> io::Result<Stat> {
        Stat::of(path.as_ref(), false)
    }

    /// Best-effort permission change.
    pub fn chmod<P: AsRef<Path>>(&self, path: P, mode: u32) -> io::Result<()> {
        metadata::chmod(path.as_ref(), mode)
    }

    /// Best-effort ownership change following symlinks.
    #[cfg(unix)]
    pub fn chown<P: AsRef<Path>>(&self, path: P, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        metadata::chown(path.as_ref(), uid, gid)
    }

    /// Best-effort ownership change of a symlink itself.
    #[cfg(unix)]
    pub fn lchown<P: AsRef<Path>>(&self, path: P, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        metadata::lchown(path.as_ref(), uid, gid)
    }
}

impl Default for GracefulFs {
    /// Facade over [`RetryQueue::global`].
    fn default() -> Self {
        Self::new(RetryQueue::global().clone())
    }
}

impl fmt::Debug for GracefulFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GracefulFs")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

fn list_dir(path: &Path) -> io::Result<Vec<OsString>> {
    let mut names = fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
