//! Core scheduling abstractions: the action entity, the store contract,
//! the control-flag channel, the runner, and the execution group.

pub mod action;
pub mod control;
pub mod error;
pub mod group;
pub mod runner;
pub mod store;

pub use action::{Action, ActionExecutor, ActionStatus, StepOutcome};
pub use control::{
    action_wait, control_request, has_timed_out, is_cancelled, is_resumed, is_suspended,
    reschedule, ControlFlag, ControlRequest, DEFAULT_WAIT_INTERVAL,
};
pub use error::{AppResult, SchedulerError};
pub use group::{ExecutionGroup, Spawn};
pub use runner::{run_action, RetryPolicy};
pub use store::ActionStore;
