//! Shared ambient utilities.

pub mod telemetry;

pub use telemetry::init_tracing;
