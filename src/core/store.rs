//! Store contract for action records, locks, and control flags.
//!
//! The durable store is an external collaborator; this trait is the narrow
//! contract the scheduler requires of it. All operations are treated as
//! yielding I/O. Cross-process safety of `acquire` rests on the backend's
//! transactional guarantee, not on anything in this crate.

use async_trait::async_trait;

use crate::core::action::Action;
use crate::core::control::ControlFlag;
use crate::core::error::SchedulerError;
use crate::util::serde::{ActionId, EngineId};

/// Abstraction over the durable store backing actions, locks, and control
/// flags.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Materialize the action record for `id`.
    async fn load(&self, id: &ActionId) -> Result<Action, SchedulerError>;

    /// Attempt to atomically claim exclusive ownership of the action for
    /// `owner`, stamping `start_time_ms`. Returns `true` iff the claim
    /// succeeded; `false` means another live owner holds it, which is a
    /// normal contention outcome.
    async fn acquire(
        &self,
        id: &ActionId,
        owner: &EngineId,
        start_time_ms: u128,
    ) -> Result<bool, SchedulerError>;

    /// Clear ownership if held by `owner`. Idempotent: releasing an
    /// already-released lock, or one held by a different owner, is a no-op.
    async fn release(&self, id: &ActionId, owner: &EngineId) -> Result<(), SchedulerError>;

    /// Persist terminal status `SUCCEEDED` with the given timestamp.
    async fn mark_succeeded(&self, id: &ActionId, end_time_ms: u128)
        -> Result<(), SchedulerError>;

    /// Persist terminal status `FAILED` with the given timestamp.
    async fn mark_failed(&self, id: &ActionId, end_time_ms: u128) -> Result<(), SchedulerError>;

    /// Persist terminal status `CANCELLED` with the given timestamp.
    async fn mark_cancelled(&self, id: &ActionId, end_time_ms: u128)
        -> Result<(), SchedulerError>;

    /// Write the pending control flag for the action, replacing any prior
    /// value. Fire-and-forget from the caller's perspective.
    async fn control_set(&self, id: &ActionId, flag: ControlFlag) -> Result<(), SchedulerError>;

    /// Non-destructive read of the current pending control flag. The
    /// contract has no clear operation; flags persist until overwritten.
    async fn control_peek(&self, id: &ActionId) -> Result<Option<ControlFlag>, SchedulerError>;
}
