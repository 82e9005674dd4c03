//! Configuration options for copy operations.
//!
//! This module provides [`CopyOptions`] for configuring copy behavior and the
//! [`Filter`] predicate type.
//!
//! # Example
//!
//! ```
//! use gracefs::CopyOptions;
//!
//! // Keep whatever already exists, but refuse to run into it silently
//! let options = CopyOptions::default()
//!     .with_overwrite(false)
//!     .with_error_on_exist(true)
//!     .with_preserve_timestamps(true);
//! assert!(!options.overwrites());
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Predicate deciding whether an entry takes part in a copy.
///
/// Called with the source and destination path of every entry, the root
/// included. Returning `false` skips the entry and, for a directory, its
/// whole subtree.
pub type Filter = Arc<dyn Fn(&Path, &Path) -> bool + Send + Sync + 'static>;

/// Options for copy operations.
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `overwrite` | `None` | Falls back to `clobber`, then `true` |
/// | `clobber` | `None` | Legacy spelling of `overwrite` |
/// | `error_on_exist` | `false` | Fail on an existing file when not overwriting |
/// | `preserve_timestamps` | `false` | Copy atime/mtime to files |
/// | `dereference` | `false` | Follow symlinks instead of re-creating them |
/// | `filter` | `None` | Copy everything |
///
/// # Example
///
/// ```
/// use gracefs::CopyOptions;
///
/// let options = CopyOptions::default()
///     .with_dereference(true)
///     .with_filter(|src, _dest| src.extension().is_none_or(|ext| ext != "tmp"));
/// assert!(options.dereference);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct CopyOptions {
    /// Replace existing destination files and links
    pub overwrite: Option<bool>,

    /// Legacy name for `overwrite`, consulted only when `overwrite` is unset
    pub clobber: Option<bool>,

    /// Raise [`Error::AlreadyExists`](crate::Error::AlreadyExists) instead of
    /// silently skipping when a file exists and is not overwritten
    pub error_on_exist: bool,

    /// Copy access and modification times onto copied files
    pub preserve_timestamps: bool,

    /// Follow symlinks in the source instead of re-creating them
    pub dereference: bool,

    /// Entry filter
    #[cfg_attr(feature = "serde", serde(skip))]
    pub filter: Option<Filter>,
}

impl fmt::Debug for CopyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOptions")
            .field("overwrite", &self.overwrite)
            .field("clobber", &self.clobber)
            .field("error_on_exist", &self.error_on_exist)
            .field("preserve_timestamps", &self.preserve_timestamps)
            .field("dereference", &self.dereference)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl CopyOptions {
    /// Effective overwrite policy: `overwrite`, else `clobber`, else `true`.
    pub fn overwrites(&self) -> bool {
        self.overwrite.or(self.clobber).unwrap_or(true)
    }

    /// Whether `src -> dest` passes the filter (always true without one).
    pub fn allows(&self, src: &Path, dest: &Path) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(src, dest))
    }

    /// Set the overwrite policy
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    /// Set the legacy clobber policy
    #[must_use]
    pub fn with_clobber(mut self, clobber: bool) -> Self {
        self.clobber = Some(clobber);
        self
    }

    /// Fail on existing files that are not overwritten
    #[must_use]
    pub fn with_error_on_exist(mut self, error_on_exist: bool) -> Self {
        self.error_on_exist = error_on_exist;
        self
    }

    /// Copy atime/mtime onto copied files
    #[must_use]
    pub fn with_preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }

    /// Follow symlinks in the source
    #[must_use]
    pub fn with_dereference(mut self, dereference: bool) -> Self {
        self.dereference = dereference;
        self
    }

    /// Install an entry filter
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}
