//! Retry queue for operations that hit descriptor exhaustion.
//!
//! A wrapped operation is attempted immediately. If it fails with `EMFILE` or
//! `ENFILE` the call is parked in a [`RetryQueue`] and re-attempted by drain
//! passes with a backoff that grows with the time already spent waiting,
//! until it succeeds, fails with anything else, or has been queued for the
//! deadline (60 seconds by default). Every other outcome goes straight to the
//! caller.
//!
//! Drain passes run on a [`Scheduler`]; the queue itself never blocks or
//! sleeps.

mod clock;
mod queue;
mod scheduler;
mod wrap;

pub use clock::{Clock, ManualClock, SystemClock};
pub use queue::{RetryConfig, RetryQueue, RetryQueueBuilder};
pub use scheduler::{DEFAULT_MIN_DELAY, LocalScheduler, Scheduler, Task, TimerScheduler};
pub use wrap::{Completion, Pending, Retrying};

#[cfg(feature = "tokio")]
pub use scheduler::TokioScheduler;
