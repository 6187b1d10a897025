//! # dynapool
//!
//! A dynamically-sized worker pool built on `parking_lot`'s mutex and
//! condition variable, rather than a fixed-size channel-backed pool.
//!
//! Submitted closures wait in a bounded-wait FIFO queue until a worker is
//! free; the pool manager grows the worker set when work is waiting and no
//! worker is idle (up to an optional upper bound), and shrinks it back down
//! when workers go idle above that bound. Both transitions, along with
//! ordinary dispatch, are driven by two background threads coordinating
//! through a single shared mutex and a pair of condition variables — one
//! gating the tasks-loop, one gating the workers-loop.
//!
//! ## Quick example
//!
//! ```rust
//! use dynapool::{Pool, PoolConfig};
//!
//! let pool = Pool::new(PoolConfig::new().with_upper_limit(4)).unwrap();
//! let handle = pool.submit(|| 2 + 2).unwrap();
//! assert_eq!(handle.join().unwrap(), 4);
//! pool.stop();
//! pool.join();
//! ```
//!
//! ## Bounds
//!
//! `lower_limit` is a floor the pool actively grows to fill; `upper_limit`
//! (when set) is a ceiling workers are destroyed down to once they go idle.
//! Workers currently executing a task are never interrupted by a bound
//! change — only idle workers are torn down.
//!
//! For complete examples, see `tests/pool_test.rs` and `tests/queue_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// The bounded-wait queue, worker lifecycle, task wrapping, and pool
/// manager.
pub mod core;
/// Configuration models for pool construction.
pub mod config;
/// Shared ambient utilities (structured logging setup).
pub mod util;

pub use config::PoolConfig;
pub use core::{BoundedWaitQueue, JoinHandle, Pool, PoolError, Worker};
