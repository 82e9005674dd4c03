//! Builder API for ergonomic copying operations.
//!
//! The builder pattern provides a fluent interface for configuring and
//! executing a copy. This is often more convenient than manually constructing
//! [`CopyOptions`].
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use gracefs::CopyBuilder;
//!
//! // Overwrites existing files by default
//! let stats = CopyBuilder::new("src", "dst").run()?;
//! println!("Copied {} files", stats.files_copied);
//! # Ok::<(), gracefs::Error>(())
//! ```
//!
//! ## Keeping What Is Already There
//!
//! ```no_run
//! use gracefs::CopyBuilder;
//!
//! let stats = CopyBuilder::new("src", "dst")
//!     .no_clobber()
//!     .preserve_timestamps()
//!     .run()?;
//!
//! if stats.files_skipped > 0 {
//!     println!("Kept {} existing files", stats.files_skipped);
//! }
//! # Ok::<(), gracefs::Error>(())
//! ```

use crate::copy::{CopyStats, copy};
use crate::error::Result;
use crate::options::CopyOptions;
use std::path::{Path, PathBuf};

/// A builder for configuring and executing a copy.
///
/// # Example
///
/// ```no_run
/// use gracefs::CopyBuilder;
///
/// let stats = CopyBuilder::new("/data/project", "/backup/project")
///     .dereference()
///     .filter(|src, _dest| !src.ends_with("target"))
///     .run()?;
/// # Ok::<(), gracefs::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CopyBuilder {
    src: PathBuf,
    dest: PathBuf,
    options: CopyOptions,
}

impl CopyBuilder {
    /// Create a new `CopyBuilder` with the given source and destination paths.
    ///
    /// Uses default options (overwrite, no timestamps, links kept as links).
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dest: Q) -> Self {
        Self {
            src: src.as_ref().to_path_buf(),
            dest: dest.as_ref().to_path_buf(),
            options: CopyOptions::default(),
        }
    }

    /// Replace existing destination files (the default).
    #[must_use]
    pub fn overwrite(mut self) -> Self {
        self.options = self.options.with_overwrite(true);
        self
    }

    /// Leave existing destination files alone.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gracefs::CopyBuilder;
    ///
    /// let stats = CopyBuilder::new("src", "dst")
    ///     .no_clobber()
    ///     .run()?;
    /// # Ok::<(), gracefs::Error>(())
    /// ```
    #[must_use]
    pub fn no_clobber(mut self) -> Self {
        self.options = self.options.with_overwrite(false);
        self
    }

    /// Fail on an existing destination file instead of skipping it.
    ///
    /// Only matters together with [`no_clobber`](Self::no_clobber).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gracefs::CopyBuilder;
    ///
    /// let result = CopyBuilder::new("src", "dst")
    ///     .no_clobber()
    ///     .error_on_exist()
    ///     .run();
    ///
    /// if result.is_err() {
    ///     eprintln!("Some files already exist!");
    /// }
    /// ```
    #[must_use]
    pub fn error_on_exist(mut self) -> Self {
        self.options = self.options.with_error_on_exist(true);
        self
    }

    /// Copy access and modification times onto copied files.
    #[must_use]
    pub fn preserve_timestamps(mut self) -> Self {
        self.options = self.options.with_preserve_timestamps(true);
        self
    }

    /// Follow symlinks in the source instead of re-creating them.
    #[must_use]
    pub fn dereference(mut self) -> Self {
        self.options = self.options.with_dereference(true);
        self
    }

    /// Only copy entries for which `filter(src, dest)` returns `true`.
    ///
    /// A rejected directory is skipped together with everything below it.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        self.options = self.options.with_filter(filter);
        self
    }

    /// Get a reference to the current options.
    pub fn options(&self) -> &CopyOptions {
        &self.options
    }

    /// Replace all options at once.
    #[must_use]
    pub fn with_options(mut self, options: CopyOptions) -> Self {
        self.options = options;
        self
    }

    /// Execute the copy.
    ///
    /// Works for files, links and directory trees alike.
    ///
    /// # Errors
    ///
    /// See [`copy`](crate::copy()).
    pub fn run(self) -> Result<CopyStats> {
        copy(&self.src, &self.dest, &self.options)
    }
}
