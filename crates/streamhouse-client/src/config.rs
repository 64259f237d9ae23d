//! Client Configuration
//!
//! Settings shared by every producer and consumer a `Client` creates.
//!
//! ## Environment Variables
//!
//! - `STREAMHOUSE_OPERATION_TIMEOUT_MS`: Deadline for producer/consumer creation (default: 30000)
//! - `STREAMHOUSE_SCHEMA_VALIDATION_ENFORCED`: Reject schemaless producers (default: false)
//! - `STREAMHOUSE_AUTO_DOWNLOAD_SCHEMA`: Adopt the topic's schema when none is declared (default: false)
//! - `STREAMHOUSE_REGISTRY_MAX_RETRIES`: Retries for an unavailable registry (default: 3)
//! - `STREAMHOUSE_REGISTRY_RETRY_BACKOFF_MS`: Initial retry backoff (default: 100)
//! - `STREAMHOUSE_REGISTRY_RETRY_JITTER`: Randomize retry backoff (default: false)
//!
//! Missing variables fall back to defaults; unparsable ones are logged and ignored.

use crate::retry::RetryPolicy;
use std::str::FromStr;
use std::time::Duration;
use streamhouse_schema::SchemaInfo;
use tracing::warn;

pub const ENV_OPERATION_TIMEOUT_MS: &str = "STREAMHOUSE_OPERATION_TIMEOUT_MS";
pub const ENV_SCHEMA_VALIDATION_ENFORCED: &str = "STREAMHOUSE_SCHEMA_VALIDATION_ENFORCED";
pub const ENV_AUTO_DOWNLOAD_SCHEMA: &str = "STREAMHOUSE_AUTO_DOWNLOAD_SCHEMA";
pub const ENV_REGISTRY_MAX_RETRIES: &str = "STREAMHOUSE_REGISTRY_MAX_RETRIES";
pub const ENV_REGISTRY_RETRY_BACKOFF_MS: &str = "STREAMHOUSE_REGISTRY_RETRY_BACKOFF_MS";
pub const ENV_REGISTRY_RETRY_JITTER: &str = "STREAMHOUSE_REGISTRY_RETRY_JITTER";

/// Configuration for a StreamHouse client.
///
/// ## Fields
///
/// - `operation_timeout`: Deadline for creating a producer or consumer (default: 30s)
/// - `schema_validation_enforced`: Producers must declare a schema (default: false)
/// - `auto_download_schema`: Adopt the topic's bound schema when none is declared (default: false)
/// - `registry_retry`: Backoff policy for an unavailable registry
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Deadline for producer/consumer creation, registry retries included.
    pub operation_timeout: Duration,

    /// When set, a producer that declares no schema is rejected.
    ///
    /// Consumers are never rejected for declaring no schema.
    pub schema_validation_enforced: bool,

    /// Default auto-download behavior of the synchronous create calls.
    pub auto_download_schema: bool,

    /// Retry policy for registry round trips.
    pub registry_retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(30),
            schema_validation_enforced: false,
            auto_download_schema: false,
            registry_retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `STREAMHOUSE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_OPERATION_TIMEOUT_MS) {
            config.operation_timeout = Duration::from_millis(ms);
        }
        if let Some(enforced) = parse_var(&lookup, ENV_SCHEMA_VALIDATION_ENFORCED) {
            config.schema_validation_enforced = enforced;
        }
        if let Some(auto) = parse_var(&lookup, ENV_AUTO_DOWNLOAD_SCHEMA) {
            config.auto_download_schema = auto;
        }
        if let Some(retries) = parse_var(&lookup, ENV_REGISTRY_MAX_RETRIES) {
            config.registry_retry.max_retries = retries;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_REGISTRY_RETRY_BACKOFF_MS) {
            config.registry_retry.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(jitter) = parse_var(&lookup, ENV_REGISTRY_RETRY_JITTER) {
            config.registry_retry.jitter = jitter;
        }

        config
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = key, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}

/// Per-producer settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProducerConfig {
    /// Producer name, used in logs
    pub name: Option<String>,

    /// Schema the producer writes; `None` for a schemaless producer
    pub schema: Option<SchemaInfo>,
}

impl ProducerConfig {
    pub fn with_schema(schema: SchemaInfo) -> Self {
        Self {
            name: None,
            schema: Some(schema),
        }
    }
}

/// Per-consumer settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerConfig {
    /// Schema the consumer reads with; `None` to read raw bytes
    pub schema: Option<SchemaInfo>,

    /// Overrides the client default auto-download behavior
    pub auto_download_schema: Option<bool>,
}

impl ConsumerConfig {
    pub fn with_schema(schema: SchemaInfo) -> Self {
        Self {
            schema: Some(schema),
            auto_download_schema: None,
        }
    }
}
