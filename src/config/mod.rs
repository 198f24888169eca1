//! Configuration models for the scheduler and its store backends.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, StoreBackendConfig};
