//! The coordination engine: the bounded-wait queue, worker lifecycle, task
//! wrapping, and the pool manager that ties them together.

pub mod error;
pub mod pool;
pub mod queue;
pub mod task;
pub mod worker;

pub use error::PoolError;
pub use pool::Pool;
pub use queue::BoundedWaitQueue;
pub use task::JoinHandle;
pub use worker::Worker;
