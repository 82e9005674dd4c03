//! Wrapped operations and their two calling conventions.
//!
//! A [`Retrying`] handle is created by [`RetryQueue::wrap`]. It offers an
//! explicit-callback entry point ([`Retrying::call`]), an awaitable one
//! ([`Retrying::call_async`]) and a fire-and-forget one
//! ([`Retrying::submit`]). All three share the same attempt logic.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::channel::oneshot;

use super::queue::{Job, RetryQueue};
use crate::error::is_resource_exhausted;

/// Completion callback of a wrapped operation, invoked exactly once.
pub type Completion<T> = Box<dyn FnOnce(io::Result<T>) + Send + 'static>;

type Operation<A, T> = Arc<dyn Fn(A, Completion<T>) + Send + Sync + 'static>;

/// An operation that survives descriptor exhaustion.
pub struct Retrying<A, T> {
    name: &'static str,
    op: Operation<A, T>,
    queue: RetryQueue,
}

impl<A, T> Clone for Retrying<A, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            op: self.op.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<A, T> fmt::Debug for Retrying<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<A, T> Retrying<A, T>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(name: &'static str, op: Operation<A, T>, queue: RetryQueue) -> Self {
        Self { name, op, queue }
    }

    /// Operation name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the operation, delivering the final result to `done`.
    ///
    /// The first attempt happens before this returns. `done` runs exactly
    /// once: with the first non-exhaustion outcome, or with the last
    /// exhaustion error once the queue deadline passes.
    pub fn call<F>(&self, args: A, done: F)
    where
        F: FnOnce(io::Result<T>) + Send + 'static,
    {
        Deferred {
            name: self.name,
            op: self.op.clone(),
            args,
            done: Box::new(done),
        }
        .run(&self.queue, None);
    }

    /// Run the operation and discard its result.
    pub fn submit(&self, args: A) {
        self.call(args, |_| {});
    }

    /// Run the operation and await its final result.
    pub fn call_async(&self, args: A) -> Pending<T> {
        let (tx, rx) = oneshot::channel();
        self.call(args, move |result| {
            // The receiver may have been dropped; nobody is waiting then.
            let _ = tx.send(result);
        });
        Pending { rx }
    }
}

/// Future returned by [`Retrying::call_async`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<io::Result<T>>,
}

impl<T> Future for Pending<T> {
    type Output = io::Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(io::Error::other(
                "operation dropped its completion without reporting a result",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// One outstanding call: everything needed to attempt it again.
struct Deferred<A, T> {
    name: &'static str,
    op: Operation<A, T>,
    args: A,
    done: Completion<T>,
}

impl<A, T> Deferred<A, T>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
{
    fn run(self, queue: &RetryQueue, enqueued_at: Option<Instant>) {
        let Deferred {
            name,
            op,
            args,
            done,
        } = self;
        let retry_op = op.clone();
        let retry_args = args.clone();
        let queue = queue.clone();

        op(
            args,
            Box::new(move |result| match result {
                Err(error) if is_resource_exhausted(&error) => {
                    let job = Deferred {
                        name,
                        op: retry_op,
                        args: retry_args,
                        done,
                    };
                    queue.enqueue(Box::new(job), error, enqueued_at);
                }
                other => done(other),
            }),
        );
    }
}

impl<A, T> Job for Deferred<A, T>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(self: Box<Self>, queue: &RetryQueue, enqueued_at: Instant) {
        (*self).run(queue, Some(enqueued_at));
    }

    fn abandon(self: Box<Self>, error: io::Error) {
        (self.done)(Err(error));
    }
}
