//! Engine configuration

use crate::error::ConfigError;
use crate::evaluator::OperatorDelays;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the worker count
pub const WORKER_COUNT_VAR: &str = "COMPUTING_POWER";
/// Environment variable holding the submission queue capacity
pub const QUEUE_CAPACITY_VAR: &str = "QUEUE_CAPACITY";
/// Environment variable holding the `+` delay in milliseconds
pub const ADDITION_DELAY_VAR: &str = "TIME_ADDITION_MS";
/// Environment variable holding the `-` delay in milliseconds
pub const SUBTRACTION_DELAY_VAR: &str = "TIME_SUBTRACTION_MS";
/// Environment variable holding the `*` delay in milliseconds
pub const MULTIPLICATION_DELAY_VAR: &str = "TIME_MULTIPLICATIONS_MS";
/// Environment variable holding the `/` delay in milliseconds
pub const DIVISION_DELAY_VAR: &str = "TIME_DIVISIONS_MS";

/// Configuration of the worker pool and its evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of concurrent workers, fixed for the pool's lifetime
    pub worker_count: usize,
    /// Jobs the submission queue holds before submitters wait
    pub queue_capacity: usize,
    /// Artificial latency per operator
    pub delays: OperatorDelays,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            queue_capacity: 64,
            delays: OperatorDelays::none(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with `worker_count` workers and defaults otherwise
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// Set the worker count
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the operator delays
    pub fn with_delays(mut self, delays: OperatorDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Check the configuration can start a pool
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }

    /// Read the configuration from process environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(count) = parse_var(&lookup, WORKER_COUNT_VAR)? {
            config.worker_count =
                usize::try_from(count).map_err(|_| invalid(WORKER_COUNT_VAR, count))?;
        }
        if let Some(capacity) = parse_var(&lookup, QUEUE_CAPACITY_VAR)? {
            config.queue_capacity =
                usize::try_from(capacity).map_err(|_| invalid(QUEUE_CAPACITY_VAR, capacity))?;
        }

        let delays = &mut config.delays;
        for (key, slot) in [
            (ADDITION_DELAY_VAR, &mut delays.addition),
            (SUBTRACTION_DELAY_VAR, &mut delays.subtraction),
            (MULTIPLICATION_DELAY_VAR, &mut delays.multiplication),
            (DIVISION_DELAY_VAR, &mut delays.division),
        ] {
            if let Some(ms) = parse_var(&lookup, key)? {
                *slot = Duration::from_millis(ms);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn invalid(key: &str, value: u64) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
