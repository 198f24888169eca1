//! Integration tests for the execution group and scheduling entry points.
//!
//! These tests validate real scheduling behavior including:
//! - Lock acquisition races between engines
//! - Contention and spawn-failure outcomes of `start_action`
//! - Full action lifecycle through the runner
//! - Stop semantics: graceful drain and abrupt halt, both waiting for
//!   lock-release callbacks
//! - Periodic timers

use async_trait::async_trait;
use meridian_scheduler::core::{
    Action, ActionExecutor, ActionStatus, ActionStore, ExecutionGroup, RetryPolicy, StepOutcome,
};
use meridian_scheduler::infra::store::InMemoryActionStore;
use meridian_scheduler::runtime::api;
use meridian_scheduler::runtime::TokioSpawner;
use meridian_scheduler::util::serde::{ActionId, EngineId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn make_group(
    store: &Arc<InMemoryActionStore>,
    executor: Arc<dyn ActionExecutor>,
    max_in_flight: usize,
) -> ExecutionGroup<TokioSpawner> {
    ExecutionGroup::new(
        Arc::clone(store) as Arc<dyn ActionStore>,
        executor,
        RetryPolicy {
            retry_wait: Some(Duration::from_millis(20)),
            max_retries: None,
        },
        max_in_flight,
        TokioSpawner::current(),
    )
}

fn seed(store: &InMemoryActionStore, name: &str) -> ActionId {
    let action = Action::new(name);
    let id = action.id.clone();
    store.insert(action);
    id
}

/// Poll `predicate` until it holds or the deadline passes.
async fn wait_until(predicate: impl Fn() -> bool, deadline: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    predicate()
}

// ============================================================================
// TEST EXECUTORS
// ============================================================================

/// Completes successfully after a short pause.
struct SlowOkExecutor {
    pause: Duration,
}

#[async_trait]
impl ActionExecutor for SlowOkExecutor {
    async fn execute(&self, _action: &Action) -> StepOutcome {
        tokio::time::sleep(self.pause).await;
        StepOutcome::Ok
    }
}

/// Never makes progress: every step asks for a retry.
struct AlwaysRetryExecutor;

#[async_trait]
impl ActionExecutor for AlwaysRetryExecutor {
    async fn execute(&self, _action: &Action) -> StepOutcome {
        StepOutcome::Retry
    }
}

// ============================================================================
// LOCK PROTOCOL
// ============================================================================

#[tokio::test]
async fn test_concurrent_starts_exactly_one_wins() {
    let store = Arc::new(InMemoryActionStore::new());
    let executor = Arc::new(SlowOkExecutor {
        pause: Duration::from_millis(100),
    });
    let group_a = make_group(&store, executor.clone(), 8);
    let group_b = make_group(&store, executor, 8);
    let id = seed(&store, "cluster_resize");

    let engine_a = EngineId::from_string("engine-a");
    let engine_b = EngineId::from_string("engine-b");

    let (a, b) = tokio::join!(
        api::start_action(&group_a, &id, &engine_a),
        api::start_action(&group_b, &id, &engine_b),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert!(a ^ b, "exactly one engine must win the lock (a={a}, b={b})");

    group_a.stop(true).await;
    group_b.stop(true).await;
}

#[tokio::test]
async fn test_contention_spawns_nothing_and_mutates_nothing() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(10),
        }),
        8,
    );
    let id = seed(&store, "node_delete");

    // Another worker already holds the lock.
    let other = EngineId::from_string("engine-other");
    assert!(store.acquire(&id, &other, 42).await.unwrap());
    let before = store.get(&id).unwrap();

    let started = api::start_action(&group, &id, &EngineId::from_string("engine-me"))
        .await
        .unwrap();
    assert!(!started);
    assert_eq!(group.running_count(), 0);

    let after = store.get(&id).unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.owner, before.owner);
    assert_eq!(after.start_time_ms, before.start_time_ms);

    group.stop(true).await;
}

#[tokio::test]
async fn test_spawn_failure_releases_the_lock() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(300),
        }),
        1,
    );
    let engine = EngineId::from_string("engine-a");

    // Fill the single slot.
    let busy = seed(&store, "cluster_create");
    assert!(api::start_action(&group, &busy, &engine).await.unwrap());

    // The second acquire succeeds but the task pool is exhausted; the
    // lock must be released before start_action returns.
    let id = seed(&store, "cluster_delete");
    let started = api::start_action(&group, &id, &engine).await.unwrap();
    assert!(!started);
    assert_eq!(store.get(&id).unwrap().owner, None);
    assert_eq!(group.running_count(), 1);

    group.stop(false).await;
}

#[tokio::test]
async fn test_start_unknown_action_is_an_error() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(10),
        }),
        8,
    );

    let result = api::start_action(
        &group,
        &ActionId::from_string("ghost"),
        &EngineId::new(),
    )
    .await;
    assert!(result.is_err());

    group.stop(true).await;
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_successful_action_lifecycle() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(30),
        }),
        8,
    );
    let id = seed(&store, "cluster_check");
    let engine = EngineId::new();

    assert!(api::start_action(&group, &id, &engine).await.unwrap());
    assert!(group.is_running(&id));

    let store_poll = Arc::clone(&store);
    let id_poll = id.clone();
    let done = wait_until(
        move || store_poll.get(&id_poll).unwrap().status == ActionStatus::Succeeded,
        Duration::from_secs(2),
    )
    .await;
    assert!(done, "action should reach SUCCEEDED");

    // The completion callback releases the lock and drains the map.
    let store_poll = Arc::clone(&store);
    let id_poll = id.clone();
    assert!(
        wait_until(
            move || store_poll.get(&id_poll).unwrap().owner.is_none(),
            Duration::from_secs(2),
        )
        .await
    );

    group.stop(true).await;
    assert_eq!(group.running_count(), 0);
}

// ============================================================================
// STOP SEMANTICS
// ============================================================================

#[tokio::test]
async fn test_abrupt_stop_still_runs_release_callbacks() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(&store, Arc::new(AlwaysRetryExecutor), 8);
    let id = seed(&store, "cluster_repair");
    let engine = EngineId::new();

    assert!(api::start_action(&group, &id, &engine).await.unwrap());
    assert!(store.get(&id).unwrap().owner.is_some());

    // The runner is mid retry-wait; halt it abruptly. Stop must still
    // wait for the lock-release callback before returning.
    group.stop(false).await;

    let record = store.get(&id).unwrap();
    assert_eq!(record.owner, None, "lock must be released by the callback");
    assert!(!record.status.is_terminal());
    assert_eq!(group.running_count(), 0);
}

#[tokio::test]
async fn test_graceful_stop_lets_tasks_finish() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(80),
        }),
        8,
    );
    let id = seed(&store, "node_join");
    let engine = EngineId::new();

    assert!(api::start_action(&group, &id, &engine).await.unwrap());
    group.stop(true).await;

    let record = store.get(&id).unwrap();
    assert_eq!(record.status, ActionStatus::Succeeded);
    assert_eq!(record.owner, None);
}

#[tokio::test]
async fn test_stopped_group_refuses_new_actions() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(10),
        }),
        8,
    );
    group.stop(true).await;

    let id = seed(&store, "late_arrival");
    let started = api::start_action(&group, &id, &EngineId::new())
        .await
        .unwrap();
    assert!(!started);
    // The lock taken for the refused start is handed back.
    assert_eq!(store.get(&id).unwrap().owner, None);
}

// ============================================================================
// TIMERS
// ============================================================================

#[tokio::test]
async fn test_timer_fires_until_stop() {
    let store = Arc::new(InMemoryActionStore::new());
    let group = make_group(
        &store,
        Arc::new(SlowOkExecutor {
            pause: Duration::from_millis(10),
        }),
        8,
    );

    let fired = Arc::new(AtomicU32::new(0));
    let fired_timer = Arc::clone(&fired);
    group
        .add_timer(Duration::from_millis(20), move || {
            let fired = Arc::clone(&fired_timer);
            async move {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(110)).await;
    group.stop(true).await;

    let at_stop = fired.load(Ordering::SeqCst);
    assert!(at_stop >= 3, "timer should have fired repeatedly, got {at_stop}");

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(fired.load(Ordering::SeqCst), at_stop, "timer must stop firing");
}
