//! In-memory action store for development/testing.
//!
//! A single mutex over both maps makes `acquire` atomic against concurrent
//! callers within the process, which is all a non-durable backend can
//! promise. Fleet-wide exclusion needs a transactional backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::action::{Action, ActionStatus};
use crate::core::control::ControlFlag;
use crate::core::error::SchedulerError;
use crate::core::store::ActionStore;
use crate::util::serde::{ActionId, EngineId};

#[derive(Default)]
struct Inner {
    actions: HashMap<ActionId, Action>,
    flags: HashMap<ActionId, ControlFlag>,
}

/// In-memory store over action records and control flags.
#[derive(Default)]
pub struct InMemoryActionStore {
    inner: Mutex<Inner>,
}

impl InMemoryActionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an action record, replacing any prior record
    /// with the same id.
    pub fn insert(&self, action: Action) {
        self.inner.lock().actions.insert(action.id.clone(), action);
    }

    /// Snapshot the current record for an action, if present.
    pub fn get(&self, id: &ActionId) -> Option<Action> {
        self.inner.lock().actions.get(id).cloned()
    }

    fn mark(
        &self,
        id: &ActionId,
        status: ActionStatus,
        end_time_ms: u128,
    ) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        let action = inner
            .actions
            .get_mut(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
        action.status = status;
        action.end_time_ms = Some(end_time_ms);
        Ok(())
    }
}

#[async_trait]
impl ActionStore for InMemoryActionStore {
    async fn load(&self, id: &ActionId) -> Result<Action, SchedulerError> {
        self.get(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    async fn acquire(
        &self,
        id: &ActionId,
        owner: &EngineId,
        start_time_ms: u128,
    ) -> Result<bool, SchedulerError> {
        let mut inner = self.inner.lock();
        let action = inner
            .actions
            .get_mut(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
        if action.owner.is_some() {
            return Ok(false);
        }
        action.owner = Some(owner.clone());
        action.start_time_ms = Some(start_time_ms);
        action.status = ActionStatus::Running;
        Ok(true)
    }

    async fn release(&self, id: &ActionId, owner: &EngineId) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        if let Some(action) = inner.actions.get_mut(id) {
            if action.owner.as_ref() == Some(owner) {
                action.owner = None;
            }
        }
        Ok(())
    }

    async fn mark_succeeded(
        &self,
        id: &ActionId,
        end_time_ms: u128,
    ) -> Result<(), SchedulerError> {
        self.mark(id, ActionStatus::Succeeded, end_time_ms)
    }

    async fn mark_failed(&self, id: &ActionId, end_time_ms: u128) -> Result<(), SchedulerError> {
        self.mark(id, ActionStatus::Failed, end_time_ms)
    }

    async fn mark_cancelled(
        &self,
        id: &ActionId,
        end_time_ms: u128,
    ) -> Result<(), SchedulerError> {
        self.mark(id, ActionStatus::Cancelled, end_time_ms)
    }

    async fn control_set(&self, id: &ActionId, flag: ControlFlag) -> Result<(), SchedulerError> {
        self.inner.lock().flags.insert(id.clone(), flag);
        Ok(())
    }

    async fn control_peek(&self, id: &ActionId) -> Result<Option<ControlFlag>, SchedulerError> {
        Ok(self.inner.lock().flags.get(id).copied())
    }
}
