//! Scheduling entry points exposed to the RPC layer.
//!
//! These are the operations an external caller invokes against the
//! scheduler: `start_action` composes the lock protocol with the execution
//! group; suspend/resume/cancel are thin control-flag writes. Failure
//! detail beyond the boolean "started" result is observational (persisted
//! status, logs), never an exception across this boundary.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::control::ControlFlag;
use crate::core::error::SchedulerError;
use crate::core::group::{ExecutionGroup, Spawn};
use crate::core::store::ActionStore;
use crate::util::clock;
use crate::util::serde::{ActionId, EngineId};

/// Result of a start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartActionResponse {
    /// The action that was asked to start.
    pub action_id: ActionId,
    /// Whether this engine acquired the lock and spawned a runner task.
    /// `false` is a normal contention outcome, not a failure.
    pub started: bool,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Start an action's execution progress on this engine.
///
/// Loads the action, stamps its start time, and attempts the exclusive
/// lock for `engine_id`. On success a runner task is spawned in the group;
/// if the spawn fails the lock is released immediately so another attempt
/// can claim it. Returns `Ok(false)` when the lock is held by another
/// worker or the task could not be started.
pub async fn start_action<S: Spawn>(
    group: &ExecutionGroup<S>,
    action_id: &ActionId,
    engine_id: &EngineId,
) -> Result<bool, SchedulerError> {
    let mut action = group.store().load(action_id).await?;

    let start_time_ms = clock::now_ms();
    action.start_time_ms = Some(start_time_ms);

    let locked = group
        .store()
        .acquire(action_id, engine_id, start_time_ms)
        .await?;
    if !locked {
        info!(action_id = %action_id, "action has been locked by another worker");
        return Ok(false);
    }
    info!(action_id = %action_id, engine_id = %engine_id, "successfully locked action");

    if group.start_action_task(action, engine_id.clone()).is_none() {
        debug!(action_id = %action_id, "action task start failed, unlocking action");
        group.store().release(action_id, engine_id).await?;
        return Ok(false);
    }
    Ok(true)
}

/// Request an action suspend at its next yield point. Fire-and-forget:
/// the write is accepted by the store, nothing confirms application.
pub async fn suspend_action(
    store: &dyn ActionStore,
    action_id: &ActionId,
) -> Result<(), SchedulerError> {
    store.control_set(action_id, ControlFlag::Suspend).await
}

/// Request a suspended action continue.
pub async fn resume_action(
    store: &dyn ActionStore,
    action_id: &ActionId,
) -> Result<(), SchedulerError> {
    store.control_set(action_id, ControlFlag::Resume).await
}

/// Request an action cancel cooperatively.
pub async fn cancel_action(
    store: &dyn ActionStore,
    action_id: &ActionId,
) -> Result<(), SchedulerError> {
    store.control_set(action_id, ControlFlag::Cancel).await
}

/// Return a health payload.
pub fn health() -> Health {
    Health { ok: true }
}
