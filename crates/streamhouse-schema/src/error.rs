//! Schema Error Types
//!
//! Every failure in this crate is returned as a typed `SchemaError`; nothing in
//! the codec or the compatibility policy panics.
//!
//! ## Retry semantics
//!
//! - `IncompatibleSchema`: never retried, the caller must change its schema
//! - `MalformedSchema` / `InvalidSchema`: fatal to the call
//! - `RegistryUnavailable`: transient, safe to retry the whole bind

use crate::types::{SchemaRole, SchemaType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error(
        "Incompatible schema for {role} on topic '{topic}': expected {}, got {} ({reason})",
        type_label(.expected),
        type_label(.actual)
    )]
    IncompatibleSchema {
        topic: String,
        role: SchemaRole,
        /// Type of the schema currently bound to the topic
        expected: Option<SchemaType>,
        /// Type the client declared
        actual: Option<SchemaType>,
        reason: String,
    },

    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Schema registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SchemaError {
    /// Whether retrying the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchemaError::RegistryUnavailable(_))
    }
}

fn type_label(schema_type: &Option<SchemaType>) -> &'static str {
    match schema_type {
        Some(t) => t.as_str(),
        None => "no schema",
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Serialization(err.to_string())
    }
}
