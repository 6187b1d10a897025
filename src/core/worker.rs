//! A single execution context with a one-slot mailbox, a stop flag, and an
//! after-completion callback that hands the worker back to its owner.
//!
//! Grounded on the worker-thread loop in the worker pool's native
//! implementation (`task_rx.recv()` → execute → notify), adapted to a
//! per-worker mailbox instead of a shared channel so the pool manager can
//! address a specific idle worker directly when dispatching.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use super::task::Thunk;

struct Mailbox {
    slot: Mutex<Option<Thunk>>,
    wake: Condvar,
}

/// A long-lived execution context. Construction spawns the body thread
/// immediately.
///
/// `after_completion` is invoked on the worker's own thread, after a thunk
/// returns normally, while the worker holds no locks of its own — it is the
/// sole path by which the worker is returned to the idle pool.
pub struct Worker {
    id: u64,
    mailbox: Arc<Mailbox>,
    halt: Arc<AtomicBool>,
    computing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a new worker's body thread. `after_completion` is called with
    /// the worker's id each time a thunk completes normally.
    pub fn spawn<F>(id: u64, after_completion: F) -> Self
    where
        F: Fn(u64) + Send + 'static,
    {
        let mailbox = Arc::new(Mailbox {
            slot: Mutex::new(None),
            wake: Condvar::new(),
        });
        let halt = Arc::new(AtomicBool::new(false));
        let computing = Arc::new(AtomicBool::new(false));

        let body_mailbox = Arc::clone(&mailbox);
        let body_halt = Arc::clone(&halt);
        let body_computing = Arc::clone(&computing);

        let handle = thread::Builder::new()
            .name(format!("dynapool-worker-{id}"))
            .spawn(move || worker_body(id, &body_mailbox, &body_halt, &body_computing, &after_completion))
            .expect("failed to spawn worker thread");

        debug!(worker_id = id, "worker spawned");

        Self {
            id,
            mailbox,
            halt,
            computing,
            handle: Some(handle),
        }
    }

    /// The worker's identifier, stable for its lifetime.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Store `thunk` into the mailbox and wake the body thread.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the mailbox is already occupied — the
    /// caller (the pool manager) must guarantee handoff uniqueness by
    /// dequeuing a worker from the idle list before assigning.
    pub fn assign(&self, thunk: Thunk) {
        let mut slot = self.mailbox.slot.lock();
        debug_assert!(slot.is_none(), "assign called on a worker with a full mailbox");
        *slot = Some(thunk);
        drop(slot);
        self.mailbox.wake.notify_one();
    }

    /// Request that the body thread stop after its current thunk (if any)
    /// returns. Idempotent; safe before or after [`Worker::join`].
    pub fn stop(&self) {
        self.halt.store(true, Ordering::Release);
        self.mailbox.wake.notify_one();
    }

    /// Block until the body thread has terminated. Idempotent.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// True exclusively while the worker is executing a thunk.
    #[must_use]
    pub fn is_computing(&self) -> bool {
        self.computing.load(Ordering::Acquire)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

fn worker_body(
    id: u64,
    mailbox: &Mailbox,
    halt: &AtomicBool,
    computing: &AtomicBool,
    after_completion: &(dyn Fn(u64) + Send),
) {
    loop {
        let thunk = {
            let mut slot = mailbox.slot.lock();
            loop {
                if halt.load(Ordering::Acquire) {
                    debug!(worker_id = id, "worker halting, mailbox empty");
                    return;
                }
                if let Some(thunk) = slot.take() {
                    break thunk;
                }
                mailbox.wake.wait(&mut slot);
            }
        };

        computing.store(true, Ordering::Release);
        trace!(worker_id = id, "worker invoking thunk");
        let outcome = thunk.invoke();
        computing.store(false, Ordering::Release);

        match outcome {
            Ok(()) => {
                after_completion(id);
            }
            Err(()) => {
                // Abnormal surfacing from the thunk invocation itself (not a
                // caught user panic, which the submission surface already
                // intercepts): self-terminate without rejoining the idle
                // pool.
                halt.store(true, Ordering::Release);
                debug!(worker_id = id, "worker self-terminated on abnormal thunk surfacing");
                return;
            }
        }
    }
}
