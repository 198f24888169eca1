//! Control-flag channel predicates and the cooperative wait primitive.
//!
//! Control requests are decoupled from the running task's call stack: the
//! setter (an external API caller) and the reader (the action's own step
//! logic) share no memory, so the store is the only rendezvous point.
//! Flags are polled, never pushed.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::action::Action;
use crate::core::error::SchedulerError;
use crate::core::store::ActionStore;
use crate::util::clock;

/// Default pause between resume-polling checks in [`action_wait`].
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// A store-persisted control flag targeted at a specific action.
///
/// At most one value is pending per action; a new write replaces the prior
/// value. The channel has no clear operation: a flag persists until
/// overwritten, so a previously-resumed action still reads as resumed on a
/// later unrelated check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFlag {
    /// Request cooperative cancellation.
    Cancel,
    /// Request the action pause at its next yield point.
    Suspend,
    /// Request a suspended action continue.
    Resume,
}

impl fmt::Display for ControlFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cancel => "cancel",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
        };
        f.write_str(s)
    }
}

/// The effective pending control request for an action: the stored flag,
/// or `Timeout` when the action has run past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Cancel was flagged.
    Cancel,
    /// Suspend was flagged.
    Suspend,
    /// Resume was flagged.
    Resume,
    /// The action exceeded its configured timeout.
    Timeout,
}

/// True iff the action has a timeout configured and wall-clock time since
/// `start_time_ms` exceeds it. With no timeout (or no start time) this is
/// always false regardless of elapsed time.
pub fn has_timed_out(action: &Action, now_ms: u128) -> bool {
    match (action.timeout, action.start_time_ms) {
        (Some(timeout), Some(start_ms)) => now_ms.saturating_sub(start_ms) > timeout.as_millis(),
        _ => false,
    }
}

/// Resolve the effective pending control request for the action.
///
/// The timeout check takes precedence: a timed-out action is reported as
/// `Timeout` even when a cancel/suspend/resume flag is also pending.
pub async fn control_request(
    store: &dyn ActionStore,
    action: &Action,
) -> Result<Option<ControlRequest>, SchedulerError> {
    if has_timed_out(action, clock::now_ms()) {
        debug!(action_id = %action.id, "action run timeout");
        return Ok(Some(ControlRequest::Timeout));
    }

    let request = store.control_peek(&action.id).await?.map(|flag| match flag {
        ControlFlag::Cancel => ControlRequest::Cancel,
        ControlFlag::Suspend => ControlRequest::Suspend,
        ControlFlag::Resume => ControlRequest::Resume,
    });
    Ok(request)
}

/// Whether the action is flagged to be cancelled.
pub async fn is_cancelled(
    store: &dyn ActionStore,
    action: &Action,
) -> Result<bool, SchedulerError> {
    Ok(control_request(store, action).await? == Some(ControlRequest::Cancel))
}

/// Whether the action's control flag is set to suspend.
pub async fn is_suspended(
    store: &dyn ActionStore,
    action: &Action,
) -> Result<bool, SchedulerError> {
    Ok(control_request(store, action).await? == Some(ControlRequest::Suspend))
}

/// Whether the action's control flag is set to resume.
pub async fn is_resumed(
    store: &dyn ActionStore,
    action: &Action,
) -> Result<bool, SchedulerError> {
    Ok(control_request(store, action).await? == Some(ControlRequest::Resume))
}

/// Voluntarily suspend the current task for `pause`, or return immediately
/// when `pause` is `None`. This is the scheduler's single yield interface,
/// shared by the runner's retry pause and the resume-polling wait.
pub async fn reschedule(pause: Option<Duration>) {
    if let Some(pause) = pause {
        tokio::time::sleep(pause).await;
    }
}

/// Block the calling step until a resume flag is set for the action,
/// polling every `interval`.
///
/// This primitive does not observe cancel: an action waiting to resume
/// cannot be cancelled through it alone, and callers that need that must
/// layer their own cancel check on top. There is no upper bound on the
/// wait.
pub async fn action_wait(
    store: &dyn ActionStore,
    action: &Action,
    interval: Duration,
) -> Result<(), SchedulerError> {
    while !is_resumed(store, action).await? {
        reschedule(Some(interval)).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_action(timeout: Option<Duration>, start_ms: u128) -> Action {
        let mut action = Action::new("test");
        action.timeout = timeout;
        action.start_time_ms = Some(start_ms);
        action
    }

    #[test]
    fn test_no_timeout_never_times_out() {
        let action = started_action(None, 0);
        assert!(!has_timed_out(&action, u128::MAX));
    }

    #[test]
    fn test_timeout_boundary_is_strict() {
        let action = started_action(Some(Duration::from_millis(100)), 1_000);
        // Exactly at the deadline: not yet timed out.
        assert!(!has_timed_out(&action, 1_100));
        assert!(has_timed_out(&action, 1_101));
    }

    #[test]
    fn test_unstarted_action_never_times_out() {
        let mut action = Action::new("test");
        action.timeout = Some(Duration::from_millis(1));
        assert!(!has_timed_out(&action, u128::MAX));
    }

    #[test]
    fn test_flag_display() {
        assert_eq!(ControlFlag::Cancel.to_string(), "cancel");
        assert_eq!(ControlFlag::Suspend.to_string(), "suspend");
        assert_eq!(ControlFlag::Resume.to_string(), "resume");
    }
}
