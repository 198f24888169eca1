//! Postgres-backed action store adapter (schema and interface stubs).
//!
//! The `acquire` path maps onto a single conditional `UPDATE ... WHERE
//! owner IS NULL` so exclusivity rides on the database's transactional
//! guarantee.

use async_trait::async_trait;

use crate::core::action::Action;
use crate::core::control::ControlFlag;
use crate::core::error::SchedulerError;
use crate::core::store::ActionStore;
use crate::util::serde::{ActionId, EngineId};

/// Postgres action store adapter placeholder.
#[derive(Default)]
pub struct PostgresActionStore;

impl PostgresActionStore {
    /// Create a new adapter.
    pub fn new() -> Self {
        Self
    }

    /// Migration statements for action and control-flag storage.
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS ms_actions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    owner TEXT,
    start_time_ms BIGINT,
    end_time_ms BIGINT,
    timeout_ms BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_ms_actions_status ON ms_actions (status);
CREATE INDEX IF NOT EXISTS idx_ms_actions_owner ON ms_actions (owner);
"#,
            r#"
CREATE TABLE IF NOT EXISTS ms_action_control (
    action_id TEXT PRIMARY KEY,
    flag TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
        ]
    }

    fn unwired<T>() -> Result<T, SchedulerError> {
        Err(SchedulerError::Backend(
            "postgres action store not wired to database client".into(),
        ))
    }
}

#[async_trait]
impl ActionStore for PostgresActionStore {
    async fn load(&self, _id: &ActionId) -> Result<Action, SchedulerError> {
        Self::unwired()
    }

    async fn acquire(
        &self,
        _id: &ActionId,
        _owner: &EngineId,
        _start_time_ms: u128,
    ) -> Result<bool, SchedulerError> {
        Self::unwired()
    }

    async fn release(&self, _id: &ActionId, _owner: &EngineId) -> Result<(), SchedulerError> {
        Self::unwired()
    }

    async fn mark_succeeded(
        &self,
        _id: &ActionId,
        _end_time_ms: u128,
    ) -> Result<(), SchedulerError> {
        Self::unwired()
    }

    async fn mark_failed(&self, _id: &ActionId, _end_time_ms: u128) -> Result<(), SchedulerError> {
        Self::unwired()
    }

    async fn mark_cancelled(
        &self,
        _id: &ActionId,
        _end_time_ms: u128,
    ) -> Result<(), SchedulerError> {
        Self::unwired()
    }

    async fn control_set(&self, _id: &ActionId, _flag: ControlFlag) -> Result<(), SchedulerError> {
        Self::unwired()
    }

    async fn control_peek(&self, _id: &ActionId) -> Result<Option<ControlFlag>, SchedulerError> {
        Self::unwired()
    }
}
