//! Configuration models for pool construction.

pub mod pool;

pub use pool::PoolConfig;
