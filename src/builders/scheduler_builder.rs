//! Builders to construct the store and execution group from configuration.

use std::sync::Arc;

use crate::config::{SchedulerConfig, StoreBackendConfig};
use crate::core::action::ActionExecutor;
use crate::core::error::SchedulerError;
use crate::core::group::ExecutionGroup;
use crate::core::store::ActionStore;
use crate::infra::store::{InMemoryActionStore, PostgresActionStore};
use crate::runtime::TokioSpawner;

/// Build the configured store backend.
pub fn build_store(cfg: &SchedulerConfig) -> Result<Arc<dyn ActionStore>, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;
    let store: Arc<dyn ActionStore> = match cfg.store {
        StoreBackendConfig::InMemory => Arc::new(InMemoryActionStore::new()),
        StoreBackendConfig::Postgres => Arc::new(PostgresActionStore::new()),
    };
    Ok(store)
}

/// Build an execution group over the given store and action executor,
/// spawning onto the ambient tokio runtime.
///
/// # Panics
///
/// Panics if called outside a tokio runtime context.
pub fn build_group(
    cfg: &SchedulerConfig,
    store: Arc<dyn ActionStore>,
    executor: Arc<dyn ActionExecutor>,
) -> Result<ExecutionGroup<TokioSpawner>, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;
    Ok(ExecutionGroup::new(
        store,
        executor,
        cfg.retry_policy(),
        cfg.max_in_flight,
        TokioSpawner::current(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, StepOutcome};
    use async_trait::async_trait;

    struct NoopExecutor;

    #[async_trait]
    impl ActionExecutor for NoopExecutor {
        async fn execute(&self, _action: &Action) -> StepOutcome {
            StepOutcome::Ok
        }
    }

    #[tokio::test]
    async fn test_build_from_default_config() {
        let cfg = SchedulerConfig::default();
        let store = build_store(&cfg).unwrap();
        let group = build_group(&cfg, store, Arc::new(NoopExecutor)).unwrap();
        assert_eq!(group.running_count(), 0);
    }

    #[test]
    fn test_invalid_config_refused() {
        let cfg = SchedulerConfig {
            max_in_flight: 0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            build_store(&cfg),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }
}
