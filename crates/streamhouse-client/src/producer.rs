//! Producer API for sending messages to StreamHouse.
//!
//! A `Producer` is created by `Client::create_producer` once its schema
//! binding has succeeded. Every message it sends is tagged with the schema
//! version of that binding, or left untagged when the binding is schemaless.
//!
//! ## Examples
//!
//! ```ignore
//! use streamhouse_client::{Message, ProducerConfig};
//! use streamhouse_schema::{SchemaInfo, SchemaType};
//!
//! let schema = SchemaInfo::new(SchemaType::String, "greeting", "");
//! let producer = client.create_producer("greetings", ProducerConfig::with_schema(schema))?;
//!
//! producer.send(Message::new("hello")).await?;
//! assert!(producer.schema_version().is_some());
//! ```

use crate::binding::SchemaHandle;
use crate::envelope;
use crate::error::Result;
use crate::message::Message;
use crate::transport::Transport;
use std::sync::Arc;
use streamhouse_schema::{SchemaInfo, SchemaVersion};
use tracing::debug;

/// A schema-bound producer
pub struct Producer {
    name: String,
    handle: SchemaHandle,
    transport: Arc<dyn Transport>,
}

impl Producer {
    pub(crate) fn new(handle: SchemaHandle, transport: Arc<dyn Transport>, name: Option<String>) -> Self {
        let name = name.unwrap_or_else(|| format!("producer-{}", handle.topic()));
        Self {
            name,
            handle,
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &str {
        self.handle.topic()
    }

    /// Schema this producer writes, `None` when schemaless
    pub fn schema(&self) -> Option<&SchemaInfo> {
        self.handle.schema()
    }

    /// Version every sent message is tagged with
    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.handle.version()
    }

    pub fn handle(&self) -> &SchemaHandle {
        &self.handle
    }

    /// Tag a message with this producer's schema version and publish it
    pub async fn send(&self, mut message: Message) -> Result<()> {
        match self.handle.version() {
            Some(version) => envelope::attach_version(&mut message, version),
            None => message.set_schema_version(None),
        }

        let frame = envelope::encode(&message)?;
        debug!(
            producer = %self.name,
            topic = %self.topic(),
            size = frame.len(),
            "Sending message"
        );
        self.transport.publish(self.topic(), frame).await
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}
