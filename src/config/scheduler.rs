//! Scheduler configuration structures.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;
use crate::core::runner::RetryPolicy;

/// Store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store for development/testing.
    InMemory,
    /// Postgres-backed store.
    Postgres,
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum concurrently running action tasks in one engine process.
    pub max_in_flight: usize,
    /// Pause between runner retries, in seconds. `None` skips the pause.
    pub retry_wait_secs: Option<u64>,
    /// Maximum retries before an action is failed. `None` means unlimited,
    /// which is the default: the cutoff is an opt-in policy.
    pub max_retries: Option<u32>,
    /// Poll interval for the cooperative resume wait, in seconds.
    pub resume_poll_secs: u64,
    /// Interval for hosting-process periodic housekeeping tasks, in
    /// seconds.
    pub periodic_interval_secs: u64,
    /// Worker threads for a self-built runtime. `None` uses the machine's
    /// logical CPU count.
    pub worker_threads: Option<usize>,
    /// Store backend selection.
    pub store: StoreBackendConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1000,
            retry_wait_secs: Some(1),
            max_retries: None,
            resume_poll_secs: 1,
            periodic_interval_secs: 60,
            worker_threads: None,
            store: StoreBackendConfig::InMemory,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".into());
        }
        if self.resume_poll_secs == 0 {
            return Err("resume_poll_secs must be greater than 0".into());
        }
        if self.periodic_interval_secs == 0 {
            return Err("periodic_interval_secs must be greater than 0".into());
        }
        if self.worker_threads == Some(0) {
            return Err("worker_threads must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: SchedulerConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, starting from defaults.
    ///
    /// Reads a `.env` file if present, then applies `MS_`-prefixed
    /// overrides: `MS_MAX_IN_FLIGHT`, `MS_RETRY_WAIT_SECS`,
    /// `MS_MAX_RETRIES`, `MS_RESUME_POLL_SECS`, `MS_PERIODIC_INTERVAL_SECS`,
    /// `MS_WORKER_THREADS`, `MS_STORE_BACKEND` (`in_memory` | `postgres`).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("MS_MAX_IN_FLIGHT") {
            cfg.max_in_flight = v.parse().context("MS_MAX_IN_FLIGHT must be an integer")?;
        }
        if let Ok(v) = std::env::var("MS_RETRY_WAIT_SECS") {
            cfg.retry_wait_secs =
                Some(v.parse().context("MS_RETRY_WAIT_SECS must be an integer")?);
        }
        if let Ok(v) = std::env::var("MS_MAX_RETRIES") {
            cfg.max_retries = Some(v.parse().context("MS_MAX_RETRIES must be an integer")?);
        }
        if let Ok(v) = std::env::var("MS_RESUME_POLL_SECS") {
            cfg.resume_poll_secs = v
                .parse()
                .context("MS_RESUME_POLL_SECS must be an integer")?;
        }
        if let Ok(v) = std::env::var("MS_PERIODIC_INTERVAL_SECS") {
            cfg.periodic_interval_secs = v
                .parse()
                .context("MS_PERIODIC_INTERVAL_SECS must be an integer")?;
        }
        if let Ok(v) = std::env::var("MS_WORKER_THREADS") {
            cfg.worker_threads = Some(v.parse().context("MS_WORKER_THREADS must be an integer")?);
        }
        if let Ok(v) = std::env::var("MS_STORE_BACKEND") {
            cfg.store = match v.as_str() {
                "in_memory" => StoreBackendConfig::InMemory,
                "postgres" => StoreBackendConfig::Postgres,
                other => anyhow::bail!("unknown MS_STORE_BACKEND: {other}"),
            };
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }

    /// The retry policy this configuration describes.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry_wait: self.retry_wait_secs.map(Duration::from_secs),
            max_retries: self.max_retries,
        }
    }

    /// The resume-polling interval this configuration describes.
    pub fn resume_poll_interval(&self) -> Duration {
        Duration::from_secs(self.resume_poll_secs)
    }

    /// Worker threads to use, defaulting to the logical CPU count.
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get)
    }
}
