//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Lock contention and task-spawn failure are deliberately absent: both are
/// expected outcomes surfaced as a boolean "not started" result from
/// [`crate::runtime::api::start_action`], not errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No action record exists for the given identifier.
    #[error("action not found: {0}")]
    NotFound(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
    /// The execution group has been stopped and accepts no new work.
    #[error("execution group stopped")]
    GroupStopped,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
