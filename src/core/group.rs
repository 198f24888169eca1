//! Execution group manager: owns the pool of concurrently running action
//! tasks, the periodic timers, and graceful shutdown.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::core::action::{Action, ActionExecutor};
use crate::core::error::SchedulerError;
use crate::core::runner::{run_action, RetryPolicy};
use crate::core::store::ActionStore;
use crate::util::serde::{ActionId, EngineId};

/// Abstraction for spawning cooperative tasks on a runtime.
pub trait Spawn: Send + Sync + 'static {
    /// Spawn an async task and return its join handle.
    fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static;
}

/// The pool of concurrently running tasks inside one engine process.
///
/// The group maps action identifiers to the live task executing that
/// action's runner loop. At most one entry exists per action id at any
/// instant; combined with the distributed lock protocol this yields
/// at-most-one-execution-in-the-fleet for a given action.
///
/// Every action task has a completion callback that removes it from the
/// map and releases the store lock, and the callback runs even when the
/// task is halted abruptly. [`ExecutionGroup::stop`] waits for those
/// callbacks, not just the tasks, so shutdown never leaks an uncommitted
/// lock release.
///
/// The group runs no housekeeping of its own: the hosting process is
/// expected to register at least one periodic task via
/// [`ExecutionGroup::add_timer`] for store upkeep.
pub struct ExecutionGroup<S: Spawn> {
    store: Arc<dyn ActionStore>,
    executor: Arc<dyn ActionExecutor>,
    policy: RetryPolicy,
    spawner: S,
    max_in_flight: usize,
    running: Arc<Mutex<HashMap<ActionId, AbortHandle>>>,
    links: Mutex<Vec<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    stopping: AtomicBool,
}

impl<S: Spawn> ExecutionGroup<S> {
    /// Create a group over the given store, action executor, and retry
    /// policy. `max_in_flight` bounds the running-task map; a full map is
    /// a spawn failure, which callers surface as "not started".
    pub fn new(
        store: Arc<dyn ActionStore>,
        executor: Arc<dyn ActionExecutor>,
        policy: RetryPolicy,
        max_in_flight: usize,
        spawner: S,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store,
            executor,
            policy,
            spawner,
            max_in_flight,
            running: Arc::new(Mutex::new(HashMap::new())),
            links: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            timers: Mutex::new(Vec::new()),
            shutdown_tx,
            stopping: AtomicBool::new(false),
        }
    }

    /// The store this group persists against.
    pub fn store(&self) -> &Arc<dyn ActionStore> {
        &self.store
    }

    /// Number of actions currently mapped to a live task.
    pub fn running_count(&self) -> usize {
        self.running.lock().len()
    }

    /// Whether the given action currently has a live task in this group.
    pub fn is_running(&self, id: &ActionId) -> bool {
        self.running.lock().contains_key(id)
    }

    /// Run the given future as a tracked task in the group.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::GroupStopped`] once `stop` has been
    /// invoked.
    pub fn start<F>(&self, fut: F) -> Result<AbortHandle, SchedulerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.stopping.load(Ordering::SeqCst) {
            return Err(SchedulerError::GroupStopped);
        }
        let handle = self.spawner.spawn(fut);
        let abort = handle.abort_handle();
        self.tasks.lock().push(handle);
        Ok(abort)
    }

    /// Start a task running the action runner for `action`, registering a
    /// completion callback that removes the action from the running-task
    /// map and releases the lock held by `owner` once the task finishes
    /// for any reason.
    ///
    /// Returns `None` when the task cannot be started: the group is
    /// stopping, the map is at capacity, or the action already has a live
    /// task. The caller is expected to release the freshly acquired lock
    /// in that case.
    pub fn start_action_task(&self, action: Action, owner: EngineId) -> Option<AbortHandle> {
        if self.stopping.load(Ordering::SeqCst) {
            warn!(action_id = %action.id, "group is stopping, action task not started");
            return None;
        }

        let id = action.id.clone();
        let mut running = self.running.lock();
        if running.len() >= self.max_in_flight {
            warn!(
                action_id = %id,
                in_flight = running.len(),
                "task pool exhausted, action task not started"
            );
            return None;
        }
        if running.contains_key(&id) {
            warn!(action_id = %id, "action already has a live task in this group");
            return None;
        }

        let store = Arc::clone(&self.store);
        let executor = Arc::clone(&self.executor);
        let policy = self.policy.clone();
        let body = self.spawner.spawn(async move {
            if let Err(err) = run_action(store.as_ref(), executor.as_ref(), &action, &policy).await
            {
                error!(action_id = %action.id, error = %err, "action runner failed");
            }
        });
        let abort = body.abort_handle();
        // Insert before the callback task exists; removal happens only in
        // the callback, after the body has fully completed.
        running.insert(id.clone(), abort.clone());
        drop(running);

        let running_map = Arc::clone(&self.running);
        let store = Arc::clone(&self.store);
        let link = self.spawner.spawn(async move {
            if let Err(err) = body.await {
                if err.is_cancelled() {
                    debug!(action_id = %id, "action task halted");
                } else {
                    error!(action_id = %id, "action task panicked");
                }
            }
            running_map.lock().remove(&id);
            if let Err(err) = store.release(&id, &owner).await {
                error!(action_id = %id, error = %err, "failed to release action lock");
            }
        });
        self.links.lock().push(link);

        Some(abort)
    }

    /// Register a periodic task firing every `interval` until the group
    /// stops. The first firing happens one full interval after
    /// registration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::GroupStopped`] once `stop` has been
    /// invoked.
    pub fn add_timer<F, Fut>(&self, interval: Duration, task: F) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.stopping.load(Ordering::SeqCst) {
            return Err(SchedulerError::GroupStopped);
        }
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = self.spawner.spawn(async move {
            let first = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => task().await,
                    _ = shutdown_rx.changed() => break,
                }
            }
        });
        self.timers.lock().push(handle);
        Ok(())
    }

    /// Stop all tasks and timers in the group, then block until every task
    /// has exited and every completion callback has run.
    ///
    /// With `graceful` set, running tasks are allowed to reach a natural
    /// stopping point; otherwise they are halted immediately. Either way
    /// the lock-release callbacks still run and are waited for before this
    /// returns. Idempotent: a second call returns immediately.
    pub async fn stop(&self, graceful: bool) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(graceful, "stopping execution group");
        let _ = self.shutdown_tx.send(true);

        if !graceful {
            for abort in self.running.lock().values() {
                abort.abort();
            }
            for task in self.tasks.lock().iter() {
                task.abort();
            }
        }

        let timers: Vec<_> = self.timers.lock().drain(..).collect();
        for timer in timers {
            let _ = timer.await;
        }
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
        // Completion callbacks are themselves cooperatively scheduled; a
        // finished task does not imply its callback has run yet.
        let links: Vec<_> = self.links.lock().drain(..).collect();
        for link in links {
            let _ = link.await;
        }
        info!("execution group stopped");
    }
}
