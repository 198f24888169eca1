//! The action runner: drives one action's step loop and persists the
//! terminal outcome.

use std::time::Duration;

use tracing::{info, warn};

use crate::core::action::{Action, ActionExecutor, StepOutcome};
use crate::core::control;
use crate::core::error::SchedulerError;
use crate::core::store::ActionStore;
use crate::util::clock;

/// Retry behavior applied when a step returns [`StepOutcome::Retry`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Pause between retries. `None` skips the pause entirely.
    pub retry_wait: Option<Duration>,
    /// Maximum number of retries before the action is failed.
    /// `None` means unlimited, which is the default.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_wait: Some(Duration::from_secs(1)),
            max_retries: None,
        }
    }
}

/// Run one action to a terminal outcome and persist its status.
///
/// The step loop re-invokes the executor while it returns `Retry`, pausing
/// per the policy between attempts. Before each re-invocation the timeout
/// predicate is checked: an action that has run past its deadline is
/// reported as timed out rather than retried. Outcome mapping:
///
/// - `Ok` → status `SUCCEEDED`
/// - `Error` → status `FAILED`
/// - `Cancel` → status `CANCELLED`
/// - `Timeout` → reported only; no status is persisted. Callers relying on
///   persisted status must detect timeout via the control channel's
///   timeout predicate instead.
///
/// Status persistence is the only durable write performed here; which
/// outcome a step returns is entirely the executor's decision.
pub async fn run_action(
    store: &dyn ActionStore,
    executor: &dyn ActionExecutor,
    action: &Action,
    policy: &RetryPolicy,
) -> Result<(), SchedulerError> {
    info!(action = %action.name, action_id = %action.id, "action started");

    let mut attempts: u32 = 0;
    let outcome = loop {
        let outcome = executor.execute(action).await;
        if outcome != StepOutcome::Retry {
            break outcome;
        }
        if control::has_timed_out(action, clock::now_ms()) {
            break StepOutcome::Timeout;
        }
        attempts += 1;
        if let Some(max) = policy.max_retries {
            if attempts > max {
                warn!(
                    action = %action.name,
                    action_id = %action.id,
                    max_retries = max,
                    "action exhausted its retry budget"
                );
                break StepOutcome::Error;
            }
        }
        info!(action = %action.name, action_id = %action.id, "action returned with retry");
        control::reschedule(policy.retry_wait).await;
    };

    let end_time_ms = clock::now_ms();
    match outcome {
        StepOutcome::Ok => {
            store.mark_succeeded(&action.id, end_time_ms).await?;
            info!(action = %action.name, action_id = %action.id, "action completed with success");
        }
        StepOutcome::Error => {
            store.mark_failed(&action.id, end_time_ms).await?;
            info!(action = %action.name, action_id = %action.id, "action completed with failure");
        }
        StepOutcome::Cancel => {
            store.mark_cancelled(&action.id, end_time_ms).await?;
            info!(action = %action.name, action_id = %action.id, "action was cancelled");
        }
        StepOutcome::Timeout => {
            info!(action = %action.name, action_id = %action.id, "action failed with timeout");
        }
        // The loop only breaks on a non-Retry outcome.
        StepOutcome::Retry => unreachable!("retry outcome cannot escape the step loop"),
    }
    Ok(())
}
