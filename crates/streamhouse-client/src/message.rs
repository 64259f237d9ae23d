//! Message Data Structure
//!
//! A message is the unit a producer sends and a consumer receives:
//!
//! - **key**: Optional identifier (e.g., user_id)
//! - **payload**: The actual data (arbitrary bytes)
//! - **schema_version**: 8-byte tag naming the schema the payload was written
//!   with; absent for messages from a schemaless producer
//!
//! ## Example
//! ```ignore
//! let message = Message::builder()
//!     .key("user123")
//!     .payload(r#"{"action": "click"}"#)
//!     .build();
//!
//! assert!(!message.has_schema_version());
//! ```

use bytes::Bytes;
use streamhouse_schema::SchemaVersion;

/// A single message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    key: Option<Bytes>,
    payload: Bytes,
    schema_version: Option<SchemaVersion>,
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            payload: payload.into(),
            schema_version: None,
        }
    }

    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    pub fn key(&self) -> Option<&Bytes> {
        self.key.as_ref()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn has_schema_version(&self) -> bool {
        self.schema_version.is_some()
    }

    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.schema_version
    }

    pub(crate) fn set_schema_version(&mut self, version: Option<SchemaVersion>) {
        self.schema_version = version;
    }

    /// Estimate the size of this message in bytes
    pub fn estimated_size(&self) -> usize {
        self.key.as_ref().map(|k| k.len()).unwrap_or(0)
            + self.payload.len()
            + self.schema_version.map(|_| SchemaVersion::LEN).unwrap_or(0)
    }
}

/// Builder for `Message`
#[derive(Debug, Default)]
pub struct MessageBuilder {
    key: Option<Bytes>,
    payload: Bytes,
}

impl MessageBuilder {
    pub fn key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Build the message. The schema version is set by the producer at send time.
    pub fn build(self) -> Message {
        Message {
            key: self.key,
            payload: self.payload,
            schema_version: None,
        }
    }
}
