//! Action entity and the opaque execution capability.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::util::serde::{ActionId, EngineId};

/// Persisted lifecycle status of an action record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    /// Created, never dispatched.
    Init,
    /// Dispatched, waiting on an external condition.
    Waiting,
    /// A runner currently holds the lock and is executing steps.
    Running,
    /// Terminal: ran to completion.
    Succeeded,
    /// Terminal: a step reported an unrecoverable error.
    Failed,
    /// Terminal: a step observed a cancel request and stopped.
    Cancelled,
}

impl ActionStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Outcome of one execution step.
///
/// These are step outcomes, distinct from the persisted [`ActionStatus`]:
/// the runner maps them onto terminal statuses, with `Timeout` reported but
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step ran to completion; the action is done.
    Ok,
    /// Step failed unrecoverably.
    Error,
    /// Step made no terminal progress; invoke it again after the retry pause.
    Retry,
    /// Step observed a pending cancel request and stopped cooperatively.
    Cancel,
    /// Step observed that the action ran past its deadline.
    Timeout,
}

/// A durable, individually lockable unit of orchestration work.
///
/// The record itself is owned by the external store; this struct is the
/// in-process materialization a runner works against. Timestamps are
/// wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Opaque unique identifier.
    pub id: ActionId,
    /// Display name used in lifecycle log lines.
    pub name: String,
    /// Persisted lifecycle status.
    pub status: ActionStatus,
    /// Set when a runner begins executing the action.
    pub start_time_ms: Option<u128>,
    /// Set when a terminal status is persisted.
    pub end_time_ms: Option<u128>,
    /// Optional execution deadline; absence means no timeout.
    pub timeout: Option<Duration>,
    /// Engine instance currently holding the exclusive lock.
    pub owner: Option<EngineId>,
}

impl Action {
    /// Create a new action in `Init` with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            name: name.into(),
            status: ActionStatus::Init,
            start_time_ms: None,
            end_time_ms: None,
            timeout: None,
            owner: None,
        }
    }

    /// Set the execution deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The opaque execution capability of an action.
///
/// One step of business logic: the implementor decides what an action does
/// and which [`StepOutcome`] to return, including whether to observe pending
/// control flags. The runner's job is purely to interpret and persist; a
/// step that never checks the control channel runs to its natural
/// completion regardless of pending requests.
#[async_trait]
pub trait ActionExecutor: Send + Sync + 'static {
    /// Execute one step of the action's business logic.
    async fn execute(&self, action: &Action) -> StepOutcome;
}
