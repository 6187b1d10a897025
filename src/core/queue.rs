//! Bounded-wait queue: a multi-producer/multi-consumer FIFO with an explicit
//! `closed` terminal state.
//!
//! Modeled on the `Mutex` + `Condvar` pairing this crate's `ResultStorage`
//! predecessor used for blocking waits (see the worker pool's result
//! notification path): one `parking_lot::Mutex` guards the buffer and the
//! closed flag, one `parking_lot::Condvar` wakes waiters.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::error::PoolError;

struct Inner<T> {
    buffer: VecDeque<T>,
    closed: bool,
}

/// A FIFO queue of items of type `T` that blocks consumers while empty and
/// signals closure instead of blocking forever.
///
/// `closed` is one-way: once set it never clears. Producers may not push
/// after close; consumers may keep draining whatever is already buffered,
/// and only fail once the buffer is empty and closed.
pub struct BoundedWaitQueue<T> {
    state: Mutex<Inner<T>>,
    not_empty: Condvar,
}

impl<T> Default for BoundedWaitQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundedWaitQueue<T> {
    /// Create an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Inner {
                buffer: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Append `item` to the tail. Wakes at least one waiter.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::QueueClosed`] if the queue has already been
    /// closed; `item` is dropped in that case.
    pub fn push(&self, item: T) -> Result<(), PoolError> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(PoolError::QueueClosed);
            }
            state.buffer.push_back(item);
        }
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block while empty and not closed; on wake, remove and return the
    /// front item, or fail with [`PoolError::QueueClosed`] if empty and
    /// closed. Tolerates spurious wakeups by re-checking the predicate.
    pub fn pop(&self) -> Result<T, PoolError> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.buffer.pop_front() {
                drop(state);
                self.not_empty.notify_one();
                return Ok(item);
            }
            if state.closed {
                return Err(PoolError::QueueClosed);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Set `closed` and wake every waiter. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.not_empty.notify_all();
    }

    /// Snapshot: true if the buffer currently holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    /// Snapshot: number of items currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Snapshot: true if the queue has not been closed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.state.lock().closed
    }
}
