//! # gracefs
//!
//! Filesystem calls that ride out file-descriptor exhaustion, and a recursive
//! copy that replicates every entry type faithfully.
//!
//! ## Core Features
//!
//! - **Exhaustion-tolerant calls**: `EMFILE`/`ENFILE` failures are parked in a
//!   [`RetryQueue`] and retried with growing backoff for up to 60 seconds
//! - **Two calling conventions**: every wrapped operation takes a completion
//!   callback or returns an awaitable [`Pending`] future
//! - **No blocking backoff**: drain passes run on a [`Scheduler`] (timer
//!   thread, caller-pumped loop, or tokio runtime)
//! - **Faithful copy**: files, devices, directories and symlinks, with modes
//!   and optional nanosecond timestamps
//! - **Copy-into-self protection**: lexical and inode-based checks, plus
//!   target comparison before replacing a destination symlink
//! - **Unbounded depth**: the tree walk uses an explicit stack
//!
//! ## Quick Start with Builder API
//!
//! ```no_run
//! use gracefs::CopyBuilder;
//!
//! let stats = CopyBuilder::new("src", "dst").run()?;
//! println!("Copied {} files ({} bytes)", stats.files_copied, stats.bytes_copied);
//! # Ok::<(), gracefs::Error>(())
//! ```
//!
//! ## Function API
//!
//! ```no_run
//! use gracefs::{copy, CopyOptions};
//! use std::path::Path;
//!
//! let options = CopyOptions::default()
//!     .with_overwrite(false)
//!     .with_error_on_exist(true)
//!     .with_preserve_timestamps(true);
//!
//! let stats = copy(Path::new("src"), Path::new("dst"), &options)?;
//! println!("Copied {} files, skipped {}", stats.files_copied, stats.files_skipped);
//! # Ok::<(), gracefs::Error>(())
//! ```
//!
//! ## Surviving Descriptor Exhaustion
//!
//! ```no_run
//! use gracefs::{GracefulFs, RetryQueue};
//!
//! // One queue per process is usually enough
//! let fs = GracefulFs::new(RetryQueue::global().clone());
//! let bytes = futures::executor::block_on(fs.read_file_async("big.log"))?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Arbitrary operations can be wrapped too:
//!
//! ```no_run
//! use gracefs::RetryQueue;
//! use std::path::PathBuf;
//!
//! let queue = RetryQueue::new();
//! let rename = queue.wrap_sync("rename", |(from, to): (PathBuf, PathBuf)| {
//!     std::fs::rename(from, to)
//! });
//! rename.submit((PathBuf::from("a"), PathBuf::from("b")));
//! ```
//!
//! ## Diagnostics
//!
//! Set `GRACEFS_DEBUG=1` to emit one `tracing` event per enqueue, retry,
//! timeout and abandon under the `gracefs` target.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialize/Deserialize for [`CopyOptions`] and [`RetryConfig`] |
//! | `tokio` | [`TokioScheduler`] for running drain passes on a tokio runtime |
//! | `full` | Enable all optional features |

#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod copy;
mod error;
mod fs;
pub mod metadata;
mod options;
pub mod retry;
pub mod trace;
mod utils;

pub use builder::CopyBuilder;
pub use copy::{CopyStats, copy};
pub use error::{Error, Result, is_resource_exhausted};
pub use fs::GracefulFs;
pub use metadata::{EntryKind, Stat};
pub use options::{CopyOptions, Filter};
pub use retry::{
    Clock, Completion, LocalScheduler, ManualClock, Pending, RetryConfig, RetryQueue,
    RetryQueueBuilder, Retrying, Scheduler, SystemClock, TimerScheduler,
};

#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub use retry::TokioScheduler;
