//! # Meridian Scheduler
//!
//! The action execution scheduler of the Meridian cluster-orchestration
//! engine.
//!
//! An *action* is a durable, individually lockable unit of orchestration
//! work with a persisted status. This crate takes a chosen action and runs
//! it concurrently with many others inside one engine process, while
//! letting external actors influence a running action's fate — cancel it,
//! suspend it, resume it, or have it time out — without any shared memory
//! access to the running task.
//!
//! ## Core Problems Solved
//!
//! - **Fleet-wide mutual exclusion**: a distributed lock implemented
//!   through the shared store's transactional guarantee, so only one
//!   engine instance in a fleet runs a given action. Contention is a
//!   normal boolean outcome, never an error.
//! - **Cooperative control**: cancel/suspend/resume are store-persisted
//!   flags polled by the action's own step logic at its yield points.
//!   There is no preemption; a step that never checks runs to its natural
//!   completion.
//! - **Leak-free shutdown**: stopping the execution group waits for every
//!   task *and* every completion callback (lock release on finish), so a
//!   halted engine never strands an ownership record it could have
//!   cleared.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use meridian_scheduler::builders::{build_group, build_store};
//! use meridian_scheduler::config::SchedulerConfig;
//! use meridian_scheduler::runtime::api;
//! use meridian_scheduler::util::serde::EngineId;
//!
//! let cfg = SchedulerConfig::from_env()?;
//! let store = build_store(&cfg)?;
//! let group = build_group(&cfg, store.clone(), my_executor)?;
//! let engine_id = EngineId::new();
//!
//! // Returns false when another worker holds the lock.
//! let started = api::start_action(&group, &action_id, &engine_id).await?;
//!
//! // Control requests are fire-and-forget store writes.
//! api::cancel_action(store.as_ref(), &action_id).await?;
//!
//! group.stop(true).await;
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs`.

/// Core scheduling abstractions: actions, the store contract, the control
/// channel, the runner, and the execution group.
pub mod core;
/// Configuration models for the scheduler and its store backends.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for durable store backends.
pub mod infra;
/// Runtime adapters and the scheduling entry-point surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
