//! Deferred execution for drain passes.
//!
//! A [`Scheduler`] runs a task "soon": never synchronously on the caller's
//! stack, always on one execution context. The retry queue keeps at most one
//! task in flight per queue, so a scheduler never sees two drain passes of
//! the same queue at once.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a minimal delay on a single execution context.
pub trait Scheduler: Send + Sync {
    /// Queue `task` to run later.
    fn defer(&self, task: Task);
}

/// Default minimal delay between a deferral and its execution.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1);

// =============================================================================
// Cooperative run loop
// =============================================================================

/// Cooperative run loop pumped by its owner.
///
/// Nothing runs until [`run_pending`](LocalScheduler::run_pending) is called.
/// Tasks deferred while a turn is running wait for the next turn, which keeps
/// each drain pass bounded.
#[derive(Clone, Default)]
pub struct LocalScheduler {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl LocalScheduler {
    /// Create an empty run loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one turn: every task queued before this call, in FIFO order.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.drain(..).collect()
        };
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    /// Number of tasks waiting for the next turn.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Scheduler for LocalScheduler {
    fn defer(&self, task: Task) {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(task);
    }
}

impl std::fmt::Debug for LocalScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

// =============================================================================
// Timer thread
// =============================================================================

/// A single named timer thread that runs each task after a minimal delay.
///
/// All tasks share the one thread, so passes of any queue using this
/// scheduler never overlap. The thread exits when the scheduler is dropped.
#[derive(Debug)]
pub struct TimerScheduler {
    tx: mpsc::Sender<Task>,
}

impl TimerScheduler {
    /// Start a timer thread with [`DEFAULT_MIN_DELAY`].
    pub fn new() -> Self {
        Self::with_min_delay(DEFAULT_MIN_DELAY)
    }

    /// Start a timer thread with a custom minimal delay.
    pub fn with_min_delay(min_delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<Task>();
        let spawned = thread::Builder::new()
            .name("gracefs-retry".to_owned())
            .spawn(move || {
                while let Ok(task) = rx.recv() {
                    thread::sleep(min_delay);
                    task();
                }
            });
        if let Err(e) = spawned {
            tracing::error!("failed to start retry timer thread: {e}");
        }
        Self { tx }
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TimerScheduler {
    fn defer(&self, task: Task) {
        if self.tx.send(task).is_err() {
            tracing::error!("retry timer thread is gone, dropping deferred task");
        }
    }
}

// =============================================================================
// Tokio runtime
// =============================================================================

/// Runs tasks on a tokio runtime after a minimal delay.
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
    min_delay: Duration,
}

#[cfg(feature = "tokio")]
impl TokioScheduler {
    /// Use the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            min_delay: DEFAULT_MIN_DELAY,
        }
    }

    /// Use the runtime of the calling task, if any.
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }

    /// Override the minimal delay.
    #[must_use]
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }
}

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn defer(&self, task: Task) {
        let min_delay = self.min_delay;
        self.handle.spawn(async move {
            tokio::time::sleep(min_delay).await;
            task();
        });
    }
}
