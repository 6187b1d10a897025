//! The submission surface: wraps arbitrary closures into the opaque,
//! move-only, callable-once [`Thunk`] the core manipulates, and produces a
//! [`JoinHandle`] the caller can await or block on for the result.
//!
//! This sits outside the dispatch engine's own bookkeeping; it exists
//! because a usable published crate needs a richer `submit` than one
//! returning `()`. Grounded on the worker pool's `oneshot`-based result
//! notification (its WASM executor already pairs a
//! `tokio::sync::oneshot::Sender` with each task).

use std::panic::{self, AssertUnwindSafe};

use tokio::sync::oneshot;

use super::error::PoolError;

/// An opaque, move-only, callable-once unit of work with no arguments and no
/// return value — its return channel is encapsulated inside.
///
/// Invoking a thunk never lets a user panic escape past its own boundary:
/// the panic is caught and routed into the paired [`JoinHandle`] as
/// [`PoolError::TaskPanicked`].
pub struct Thunk {
    inner: Box<dyn FnOnce() + Send>,
}

impl Thunk {
    /// Wrap a zero-argument, one-shot callable.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { inner: Box::new(f) }
    }

    /// Invoke the thunk exactly once.
    ///
    /// Returns `Ok(())` on normal return, including the case where the
    /// wrapped user closure panicked (that panic is caught and has already
    /// been routed to the completion handle by the time this returns).
    /// Returns `Err(())` only if invocation itself surfaces an abnormal
    /// failure outside the caught boundary — the calling worker treats this
    /// as fatal and self-terminates rather than rejoining the idle pool.
    pub fn invoke(self) -> Result<(), ()> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.inner)())).map_err(|_| ())
    }
}

/// A handle to a task's eventual result, returned by [`crate::Pool::submit`].
///
/// Mirrors `std::thread::JoinHandle`/`std::future::Future`'s role for the
/// original C++ implementation's `std::future<R>`, backed by a
/// `tokio::sync::oneshot` channel so both a blocking and an async join are
/// available without spinning up a runtime for the blocking path.
pub struct JoinHandle<T> {
    rx: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T, PoolError>>) -> Self {
        Self { rx }
    }

    /// Block the current thread until the task completes, panics, or is
    /// aborted by a pool shutdown that preempted its dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TaskPanicked`] if the task's closure panicked, or
    /// [`PoolError::TaskAborted`] if the pool stopped before the task was
    /// dispatched.
    pub fn join(self) -> Result<T, PoolError> {
        self.rx.blocking_recv().unwrap_or(Err(PoolError::TaskAborted))
    }

    /// Await the task's completion without blocking the current thread.
    ///
    /// # Errors
    ///
    /// Same conditions as [`JoinHandle::join`].
    pub async fn join_async(self) -> Result<T, PoolError> {
        self.rx.await.unwrap_or(Err(PoolError::TaskAborted))
    }
}

/// Build a [`Thunk`] that runs `f` and a paired [`JoinHandle`] that receives
/// its result, exactly once.
pub(crate) fn make_task<F, T>(f: F) -> (Thunk, JoinHandle<T>)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let thunk = Thunk::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        let result = outcome.map_err(|_| PoolError::TaskPanicked);
        // The receiver may already be gone if the caller dropped the handle;
        // that's a normal, silent outcome.
        let _ = tx.send(result);
    });
    (thunk, JoinHandle::new(rx))
}
