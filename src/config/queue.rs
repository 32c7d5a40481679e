//! Timer queue configuration.

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Longest base delay accepted by [`QueueConfig::validate`].
pub const MAX_BASE_DELAY_MS: u64 = 60 * 60 * 1000;

/// Settings a [`TimerQueue`](crate::TimerQueue) is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name used in log fields and consumer thread names.
    pub name: String,
    /// Offset added to "soon" insertions when no delay floor is active.
    pub base_delay_ms: u64,
    /// Enables the soft-delay floor (`set_delay_until`).
    pub soft_delay: bool,
    /// Number of consumer threads `spawn_consumers` starts by default.
    pub consumer_threads: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            name: format!("timer-queue-{}", &id[..8]),
            base_delay_ms: 0,
            soft_delay: true,
            consumer_threads: num_cpus::get(),
        }
    }
}

impl QueueConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the queue name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the base delay for "soon" insertions.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable the soft-delay floor.
    #[must_use]
    pub const fn with_soft_delay(mut self, enabled: bool) -> Self {
        self.soft_delay = enabled;
        self
    }

    /// Set the default consumer thread count.
    #[must_use]
    pub const fn with_consumer_threads(mut self, count: usize) -> Self {
        self.consumer_threads = count;
        self
    }

    /// Base delay as a [`Duration`].
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.consumer_threads == 0 {
            return Err("consumer_threads must be greater than 0".into());
        }
        if self.base_delay_ms > MAX_BASE_DELAY_MS {
            return Err(format!(
                "base_delay_ms must be at most {MAX_BASE_DELAY_MS}, got {}",
                self.base_delay_ms
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `TIMER_QUEUE_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Recognised variables: `TIMER_QUEUE_NAME`, `TIMER_QUEUE_BASE_DELAY_MS`,
    /// `TIMER_QUEUE_SOFT_DELAY`, `TIMER_QUEUE_CONSUMERS`. Unset variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable cannot be parsed or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Ok(name) = env::var("TIMER_QUEUE_NAME") {
            cfg.name = name;
        }
        if let Ok(raw) = env::var("TIMER_QUEUE_BASE_DELAY_MS") {
            cfg.base_delay_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("TIMER_QUEUE_BASE_DELAY_MS is not a number: {raw}"))?;
        }
        if let Ok(raw) = env::var("TIMER_QUEUE_SOFT_DELAY") {
            cfg.soft_delay = parse_flag(&raw)
                .with_context(|| format!("TIMER_QUEUE_SOFT_DELAY is not a boolean: {raw}"))?;
        }
        if let Ok(raw) = env::var("TIMER_QUEUE_CONSUMERS") {
            cfg.consumer_threads = raw
                .trim()
                .parse()
                .with_context(|| format!("TIMER_QUEUE_CONSUMERS is not a number: {raw}"))?;
        }

        cfg.validate().map_err(|e| anyhow!("invalid timer queue config: {e}"))?;
        Ok(cfg)
    }
}

fn parse_flag(raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("unrecognised flag value `{other}`")),
    }
}
