//! Relay configuration.
//!
//! Loaded from YAML, then overridden field by field from `RELAY_*`
//! environment variables. Defaults match a mainnet relay: 25 blocks or
//! records per query, 5 attempts per query, 1000 ms between attempts.
//!
//! Validation runs before any ledger I/O.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use relay_core::{BatchLayout, CommitmentEvent, RelayError};
use relay_ledger::{
    DiscoveryMode, FetcherConfig, RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_INTERVAL_MS,
    DEFAULT_QUERY_SIZE,
};

use crate::batcher::validate_batch_size;
use crate::reconcile::RecordPolicy;

/// Settings for one relay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Blocks per event-scan query, or records per indexed-pull page.
    pub query_size: u64,
    /// Total attempts per ledger query.
    pub retry_attempts: u32,
    /// Delay between attempts, in milliseconds.
    pub retry_interval_ms: u64,
    /// Record discovery mode.
    pub discovery: DiscoveryMode,
    /// Reconciliation applied before batching.
    pub record_policy: RecordPolicy,
    /// Encoded batch layout.
    pub batch_layout: BatchLayout,
    /// Receipt event carrying the commitment.
    pub commitment_event: CommitmentEvent,
    /// Overrides the commitment's batch size when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            query_size: DEFAULT_QUERY_SIZE,
            retry_attempts: DEFAULT_ATTEMPTS,
            retry_interval_ms: DEFAULT_INTERVAL_MS,
            discovery: DiscoveryMode::default(),
            record_policy: RecordPolicy::default(),
            batch_layout: BatchLayout::default(),
            commitment_event: CommitmentEvent::default(),
            batch_size: None,
        }
    }
}

impl RelayConfig {
    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Defaults overridden by the process environment.
    ///
    /// Variables:
    /// - `RELAY_QUERY_SIZE` (default: 25)
    /// - `RELAY_RETRY_ATTEMPTS` (default: 5)
    /// - `RELAY_RETRY_INTERVAL_MS` (default: 1000)
    /// - `RELAY_DISCOVERY` (`event-scan` | `indexed-pull`)
    /// - `RELAY_RECORD_POLICY` (`verify-chain` | `latest-per-key` | `sorted-by-key`)
    /// - `RELAY_BATCH_LAYOUT` (`bytes-key` | `bytes32-key`)
    /// - `RELAY_COMMITMENT_EVENT` (`rollup` | `initiate-rollup`)
    /// - `RELAY_BATCH_SIZE` (default: taken from the commitment)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `RELAY_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `RELAY_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = env_parse(&lookup, "RELAY_QUERY_SIZE")? {
            self.query_size = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_RETRY_ATTEMPTS")? {
            self.retry_attempts = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_RETRY_INTERVAL_MS")? {
            self.retry_interval_ms = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_DISCOVERY")? {
            self.discovery = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_RECORD_POLICY")? {
            self.record_policy = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_BATCH_LAYOUT")? {
            self.batch_layout = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_COMMITMENT_EVENT")? {
            self.commitment_event = v;
        }
        if let Some(v) = env_parse(&lookup, "RELAY_BATCH_SIZE")? {
            self.batch_size = Some(v);
        }
        Ok(())
    }

    /// Reject settings that cannot run.
    ///
    /// # Errors
    ///
    /// `RelayError::InvalidBatchSize` for a zero batch-size override,
    /// `RelayError::Config` for a zero query size or attempt count.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.query_size == 0 {
            return Err(RelayError::Config("query_size must be at least 1".into()));
        }
        if let Some(size) = self.batch_size {
            validate_batch_size(size)?;
        }
        self.retry_policy().map(|_| ())
    }

    /// The retry policy these settings describe.
    pub fn retry_policy(&self) -> Result<RetryPolicy, RelayError> {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_interval_ms),
        )
    }

    /// Fetcher settings.
    pub fn fetcher_config(&self) -> Result<FetcherConfig, RelayError> {
        Ok(FetcherConfig {
            query_size: self.query_size,
            retry: self.retry_policy()?,
            discovery: self.discovery,
            commitment_event: self.commitment_event,
        })
    }
}

fn env_parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML is malformed or names an unknown field.
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> Self {
        RelayError::Config(err.to_string())
    }
}
