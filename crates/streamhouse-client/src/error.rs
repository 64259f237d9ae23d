//! Error types for StreamHouse client operations.
//!
//! This module defines all possible errors that can occur while binding a
//! producer or consumer to a topic schema and while moving messages through it.
//!
//! ## Error Handling Strategy
//!
//! - **Retriable errors**: `RegistryUnavailable`, `Timeout`
//! - **Caller errors**: `IncompatibleSchema`, `InvalidSchema`, `ConfigError`
//! - **Data errors**: `MalformedSchema`, `MalformedMessage`
//! - **Fatal errors**: `SubscriptionClosed`, `Internal`
//!
//! Errors are `Clone`: a single binding outcome may be observed by several
//! waiters of the same future.
//!
//! ## Examples
//!
//! ```ignore
//! use streamhouse_client::{Client, ClientError, ProducerConfig};
//!
//! match client.create_producer("orders", ProducerConfig::default()) {
//!     Ok(producer) => println!("Bound at {:?}", producer.schema_version()),
//!     Err(ClientError::IncompatibleSchema { expected, actual, .. }) => {
//!         eprintln!("Topic expects {:?}, producer declared {:?}", expected, actual);
//!     }
//!     Err(e) if e.is_retryable() => eprintln!("Try again: {}", e),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::time::Duration;
use streamhouse_schema::{SchemaError, SchemaRole, SchemaType};
use thiserror::Error;

/// Convenience type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error type for StreamHouse client operations.
///
/// ## Error Categories
///
/// - **Policy**: `IncompatibleSchema`
/// - **Schema data**: `MalformedSchema`, `InvalidSchema`
/// - **Communication**: `RegistryUnavailable`, `Timeout`
/// - **Messages**: `MalformedMessage`, `SubscriptionClosed`
/// - **Configuration**: `ConfigError`
/// - **Unknown**: `Internal`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The topic's schema policy rejected the binding.
    ///
    /// ## Causes
    /// - A producer declared a schema whose type or definition differs from
    ///   the one bound to the topic
    /// - A consumer declared a schema of a different type
    /// - A producer declared no schema while validation is enforced
    ///
    /// ## Resolution
    /// - Declare the topic's schema, or enable auto-download
    /// - Never retried: the same request gets the same verdict
    #[error(
        "Incompatible schema for {role} on topic '{topic}': expected {}, got {} ({reason})",
        type_label(.expected),
        type_label(.actual)
    )]
    IncompatibleSchema {
        topic: String,
        role: SchemaRole,
        expected: Option<SchemaType>,
        actual: Option<SchemaType>,
        reason: String,
    },

    /// A composite key/value schema could not be decoded.
    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    /// The registry refused a schema definition that does not parse.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The schema registry could not be reached.
    ///
    /// Registry calls are retried with backoff before this is reported.
    ///
    /// ## Resolution
    /// - Check that the registry is running
    /// - Increase `registry_max_retries`
    #[error("Schema registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// Producer or consumer creation exceeded the configured timeout.
    ///
    /// No handle is created. A registry-side bind that completed before the
    /// deadline is not undone.
    ///
    /// ## Resolution
    /// - Increase `operation_timeout` in the client configuration
    /// - Check registry latency
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A received frame could not be decoded into a message.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The subscription's transport side went away.
    #[error("Subscription '{0}' is closed")]
    SubscriptionClosed(String),

    /// Internal error that shouldn't normally occur.
    ///
    /// ## Causes
    /// - A binding task was cancelled or panicked
    /// - A completion primitive was dropped without a value
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether retrying the same operation can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::RegistryUnavailable(_) | ClientError::Timeout(_)
        )
    }
}

fn type_label(schema_type: &Option<SchemaType>) -> &'static str {
    match schema_type {
        Some(t) => t.as_str(),
        None => "no schema",
    }
}

impl From<SchemaError> for ClientError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::IncompatibleSchema {
                topic,
                role,
                expected,
                actual,
                reason,
            } => ClientError::IncompatibleSchema {
                topic,
                role,
                expected,
                actual,
                reason,
            },
            SchemaError::MalformedSchema(msg) => ClientError::MalformedSchema(msg),
            SchemaError::InvalidSchema(msg) => ClientError::InvalidSchema(msg),
            SchemaError::RegistryUnavailable(msg) => ClientError::RegistryUnavailable(msg),
            SchemaError::Serialization(msg) => ClientError::InvalidSchema(msg),
        }
    }
}
