//! Recursive copy engine.
//!
//! This module provides [`copy`], a synchronous, single-threaded copy of a
//! file, link or directory tree. Every entry is classified from a fresh stat
//! and handled according to its type:
//!
//! | Entry | Action |
//! |-------|--------|
//! | Regular file, char/block device | Copy bytes, then mode (and optionally times) |
//! | Directory | Create if missing, copy children, then mode |
//! | Symlink | Re-create with the same (or absolutized) target |
//! | Socket, FIFO | [`Error::UnsupportedEntryType`](crate::Error::UnsupportedEntryType) |
//! | Anything else | [`Error::UnknownEntryType`](crate::Error::UnknownEntryType) |
//!
//! The engine never retries; descriptor exhaustion surfaces as
//! [`Error::ResourceExhausted`](crate::Error::ResourceExhausted).

mod check;
mod dir;
mod file;
mod link;
mod utils;

pub use dir::{CopyStats, copy};
