//! Manager configuration
//!
//! Loaded from TOML, overridable through `ACTOR_MANAGER_*` environment
//! variables, validated before use. Every field has a default so an empty
//! file is a valid configuration.

use crate::effects::TtlPolicy;
use crate::errors::{ActorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ACTOR_MANAGER_";

/// Longest accepted entry lifetime, in days
pub const MAX_TTL_DAYS: u64 = 36_500;

/// Expiration settings for stored entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    /// Lifetime of actor records in days
    pub long_days: u64,
    /// Lifetime of chosen pointers in days
    pub short_days: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            long_days: 365,
            short_days: 30,
        }
    }
}

/// Runtime settings of an actor manager instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name of the broadcast channel shared by all instances
    pub channel_name: String,
    /// Delay before the ambient storage-access check
    pub init_delay_ms: u64,
    /// Delay before acting on a received channel message, covering the
    /// store's own cross-context propagation latency
    pub propagation_delay_ms: u64,
    /// Buffered announcements per subscriber before the slowest one lags
    pub announcement_capacity: usize,
    /// Entry lifetimes
    pub ttl: TtlConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            channel_name: "actors".to_string(),
            init_delay_ms: 10,
            propagation_delay_ms: 50,
            announcement_capacity: 256,
            ttl: TtlConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ActorError::invalid_input(format!("Invalid configuration: {e}")))
    }

    /// Load a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ActorError::internal(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `ACTOR_MANAGER_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; unknown names are ignored.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match field {
                "CHANNEL_NAME" => self.channel_name = value,
                "INIT_DELAY_MS" => self.init_delay_ms = parse_number(&key, &value)?,
                "PROPAGATION_DELAY_MS" => self.propagation_delay_ms = parse_number(&key, &value)?,
                "ANNOUNCEMENT_CAPACITY" => {
                    self.announcement_capacity = parse_number(&key, &value)?;
                }
                "TTL_LONG_DAYS" => self.ttl.long_days = parse_number(&key, &value)?,
                "TTL_SHORT_DAYS" => self.ttl.short_days = parse_number(&key, &value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject configurations the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.channel_name.is_empty() {
            return Err(ActorError::invalid_input("channel_name cannot be empty"));
        }
        if self.announcement_capacity == 0 {
            return Err(ActorError::invalid_input(
                "announcement_capacity must be at least 1",
            ));
        }
        if self.ttl.short_days == 0 || self.ttl.long_days == 0 {
            return Err(ActorError::invalid_input("TTLs must be at least one day"));
        }
        if self.ttl.long_days > MAX_TTL_DAYS {
            return Err(ActorError::invalid_input(format!(
                "ttl.long_days cannot exceed {MAX_TTL_DAYS}"
            )));
        }
        if self.ttl.short_days > self.ttl.long_days {
            return Err(ActorError::invalid_input(
                "ttl.short_days cannot exceed ttl.long_days",
            ));
        }
        Ok(())
    }

    /// Delay before the ambient storage-access check.
    pub fn init_delay(&self) -> Duration {
        Duration::from_millis(self.init_delay_ms)
    }

    /// Delay before acting on a received channel message.
    pub fn propagation_delay(&self) -> Duration {
        Duration::from_millis(self.propagation_delay_ms)
    }

    /// Entry lifetimes for storage handlers.
    pub fn ttl_policy(&self) -> TtlPolicy {
        const DAY_SECS: u64 = 24 * 60 * 60;
        TtlPolicy {
            long: Duration::from_secs(self.ttl.long_days.saturating_mul(DAY_SECS)),
            short: Duration::from_secs(self.ttl.short_days.saturating_mul(DAY_SECS)),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ActorError::invalid_input(format!("{key}: expected a number, got \"{value}\"")))
}
