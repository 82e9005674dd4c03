//! The retry queue.
//!
//! Entries are appended at the tail when a wrapped operation fails with
//! resource exhaustion and are taken from the head by drain passes. A pass
//! considers every entry present when it starts exactly once: entries past
//! the deadline are abandoned, due entries are retried, the rest go back to
//! the tail. Retried operations complete on their own schedule; a pass never
//! waits for them.
//!
//! The wake-up slot allows one pending or running pass per queue:
//!
//! ```text
//! Idle --enqueue--> Pending(t) --pass t starts--> Draining --queue empty--> Idle
//!                       ^                             |
//!                       +-------entries remain--------+
//! ```
//!
//! [`RetryQueue::reset`] moves `Idle`/`Pending` straight to `Draining` and
//! retires the pending ticket, so the stale wake-up finds nothing to do.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};
use super::scheduler::{Scheduler, TimerScheduler};
use super::wrap::{Completion, Retrying};
use crate::trace;

// =============================================================================
// Configuration
// =============================================================================

/// Timing policy of a [`RetryQueue`].
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `deadline` | 60 s | Total time an entry may stay queued |
/// | `max_delay` | 100 ms | Cap on the backoff threshold |
/// | `growth` | 1.2 | Multiplier applied to the time already stalled |
/// | `min_stall` | 1 ms | Floor of the stalled time before multiplying |
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryConfig {
    /// Entries queued this long are abandoned with their last error
    pub deadline: Duration,
    /// Upper bound of the backoff threshold
    pub max_delay: Duration,
    /// Growth factor of the threshold relative to the time stalled
    pub growth: f64,
    /// Stalled time assumed for an entry that has not been retried yet
    pub min_stall: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            max_delay: Duration::from_millis(100),
            growth: 1.2,
            min_stall: Duration::from_millis(1),
        }
    }
}

impl RetryConfig {
    /// Set the abandonment deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the backoff cap
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the growth factor
    ///
    /// Values below 1.0 (and NaN) are clamped to 1.0.
    #[must_use]
    pub fn with_growth(mut self, growth: f64) -> Self {
        self.growth = if growth >= 1.0 { growth } else { 1.0 };
        self
    }

    /// How long an entry must wait after its last attempt before it is due.
    ///
    /// `min(max(last_attempt_at - enqueued_at, min_stall) * growth, max_delay)`.
    /// The threshold follows the time the entry has been stalled, not the
    /// number of attempts, so it grows geometrically with waiting time until
    /// it hits the cap.
    pub fn backoff_delay(&self, enqueued_at: Instant, last_attempt_at: Instant) -> Duration {
        let stalled = last_attempt_at
            .saturating_duration_since(enqueued_at)
            .max(self.min_stall);
        let nanos = (stalled.as_nanos() as f64 * self.growth).round();
        if nanos.is_finite() && nanos < self.max_delay.as_nanos() as f64 {
            Duration::from_nanos(nanos as u64)
        } else {
            self.max_delay
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

/// A type-erased deferred call: operation, arguments and completion.
pub(crate) trait Job: Send {
    /// Operation name for diagnostics.
    fn name(&self) -> &'static str;

    /// Issue the operation again, keeping the original enqueue time.
    fn attempt(self: Box<Self>, queue: &RetryQueue, enqueued_at: Instant);

    /// Give up and hand `error` to the completion.
    fn abandon(self: Box<Self>, error: io::Error);
}

struct RetryEntry {
    job: Box<dyn Job>,
    last_error: io::Error,
    enqueued_at: Instant,
    last_attempt_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Idle,
    Pending(u64),
    Draining,
}

struct State {
    entries: VecDeque<RetryEntry>,
    wake: Wake,
    next_ticket: u64,
}

impl State {
    /// Claim the wake-up slot for a new pass and return its ticket.
    fn arm(&mut self) -> u64 {
        self.next_ticket += 1;
        self.wake = Wake::Pending(self.next_ticket);
        self.next_ticket
    }
}

struct Inner {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    config: RetryConfig,
}

// =============================================================================
// Queue
// =============================================================================

/// FIFO of operations waiting out descriptor exhaustion.
///
/// `RetryQueue` is a cheap handle; clones share the same entries and the same
/// wake-up slot. Build one per component that needs isolation, or use
/// [`RetryQueue::global`] at the composition root.
///
/// # Example
///
/// ```no_run
/// use gracefs::RetryQueue;
/// use std::path::PathBuf;
///
/// let queue = RetryQueue::new();
/// let read = queue.wrap_sync("read_file", |path: PathBuf| std::fs::read(path));
/// read.call(PathBuf::from("Cargo.toml"), |result| {
///     println!("read {} bytes", result.map(|b| b.len()).unwrap_or(0));
/// });
/// ```
#[derive(Clone)]
pub struct RetryQueue {
    inner: Arc<Inner>,
}

static GLOBAL: OnceLock<RetryQueue> = OnceLock::new();

impl RetryQueue {
    /// Queue on the system clock with its own timer thread.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a queue.
    pub fn builder() -> RetryQueueBuilder {
        RetryQueueBuilder::default()
    }

    /// The process-wide queue, created on first use.
    pub fn global() -> &'static RetryQueue {
        GLOBAL.get_or_init(RetryQueue::new)
    }

    /// Timing policy of this queue.
    pub fn config(&self) -> &RetryConfig {
        &self.inner.config
    }

    /// Number of entries waiting for a retry.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no entry is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap a callback-style operation.
    ///
    /// `op` must invoke its completion exactly once.
    pub fn wrap<A, T, F>(&self, name: &'static str, op: F) -> Retrying<A, T>
    where
        A: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(A, Completion<T>) + Send + Sync + 'static,
    {
        Retrying::new(name, Arc::new(op), self.clone())
    }

    /// Wrap a blocking operation that returns its result directly.
    pub fn wrap_sync<A, T, F>(&self, name: &'static str, op: F) -> Retrying<A, T>
    where
        A: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(A) -> io::Result<T> + Send + Sync + 'static,
    {
        self.wrap(name, move |args: A, done: Completion<T>| done(op(args)))
    }

    /// Restart every queued entry's clock and drain right away.
    ///
    /// Call this when descriptor pressure is known to have eased. Each entry
    /// is replaced by one whose enqueue and last-attempt times are now, which
    /// also restarts its deadline. A pending wake-up is superseded; if a pass
    /// is already running it picks the rewound entries up on its next turn.
    pub fn reset(&self) {
        let now = self.inner.clock.now();
        let budget = {
            let mut state = self.lock();
            let rewound: VecDeque<RetryEntry> = state
                .entries
                .drain(..)
                .map(|entry| RetryEntry {
                    enqueued_at: now,
                    last_attempt_at: now,
                    ..entry
                })
                .collect();
            state.entries = rewound;
            trace::event!("reset", queued = state.entries.len());

            match state.wake {
                Wake::Draining => None,
                Wake::Idle | Wake::Pending(_) if state.entries.is_empty() => {
                    state.wake = Wake::Idle;
                    None
                }
                Wake::Idle | Wake::Pending(_) => {
                    state.wake = Wake::Draining;
                    Some(state.entries.len())
                }
            }
        };

        if let Some(budget) = budget {
            self.drain(budget);
        }
    }

    pub(crate) fn enqueue(
        &self,
        job: Box<dyn Job>,
        last_error: io::Error,
        enqueued_at: Option<Instant>,
    ) {
        let now = self.inner.clock.now();
        let name = job.name();
        let ticket = {
            let mut state = self.lock();
            state.entries.push_back(RetryEntry {
                job,
                last_error,
                enqueued_at: enqueued_at.unwrap_or(now),
                last_attempt_at: now,
            });
            trace::event!("enqueue", op = name, queued = state.entries.len());
            match state.wake {
                Wake::Idle => Some(state.arm()),
                Wake::Pending(_) | Wake::Draining => None,
            }
        };

        if let Some(ticket) = ticket {
            self.defer_pass(ticket);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn defer_pass(&self, ticket: u64) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.scheduler.defer(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                RetryQueue { inner }.run_pass(ticket);
            }
        }));
    }

    fn run_pass(&self, ticket: u64) {
        let budget = {
            let mut state = self.lock();
            if state.wake != Wake::Pending(ticket) {
                return;
            }
            state.wake = Wake::Draining;
            state.entries.len()
        };
        self.drain(budget);
    }

    /// Consider `budget` entries from the head, then release or re-arm the slot.
    fn drain(&self, budget: usize) {
        for _ in 0..budget {
            let next = self.lock().entries.pop_front();
            let Some(entry) = next else {
                break;
            };
            self.process(entry);
        }

        let ticket = {
            let mut state = self.lock();
            if state.entries.is_empty() {
                state.wake = Wake::Idle;
                None
            } else {
                Some(state.arm())
            }
        };
        if let Some(ticket) = ticket {
            self.defer_pass(ticket);
        }
    }

    fn process(&self, entry: RetryEntry) {
        let now = self.inner.clock.now();
        let config = &self.inner.config;
        let RetryEntry {
            job,
            last_error,
            enqueued_at,
            last_attempt_at,
        } = entry;

        let waited = now.saturating_duration_since(enqueued_at);
        if waited >= config.deadline {
            let name = job.name();
            trace::event!("timeout", op = name, waited_ms = waited.as_millis() as u64);
            job.abandon(last_error);
            trace::event!("abandon", op = name);
            return;
        }

        let since_attempt = now.saturating_duration_since(last_attempt_at);
        if since_attempt >= config.backoff_delay(enqueued_at, last_attempt_at) {
            trace::event!("retry", op = job.name(), waited_ms = waited.as_millis() as u64);
            job.attempt(self, enqueued_at);
        } else {
            self.lock().entries.push_back(RetryEntry {
                job,
                last_error,
                enqueued_at,
                last_attempt_at,
            });
        }
    }
}

impl Default for RetryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetryQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("RetryQueue")
            .field("queued", &state.entries.len())
            .field("wake", &state.wake)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for a [`RetryQueue`] with custom clock, scheduler or timing.
#[derive(Default)]
pub struct RetryQueueBuilder {
    clock: Option<Arc<dyn Clock>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    config: RetryConfig,
}

impl RetryQueueBuilder {
    /// Use a custom time source
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom scheduler for drain passes
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Use custom timing
    #[must_use]
    pub fn config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the queue.
    ///
    /// Defaults to [`SystemClock`] and a fresh [`TimerScheduler`].
    pub fn build(self) -> RetryQueue {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TimerScheduler::new()));
        RetryQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries: VecDeque::new(),
                    wake: Wake::Idle,
                    next_ticket: 0,
                }),
                clock,
                scheduler,
                config: self.config,
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
