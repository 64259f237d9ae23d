//! Consumer API for receiving messages from StreamHouse.
//!
//! A `Consumer` owns one subscription on one topic. Its schema binding is
//! lenient: a consumer without a schema reads raw bytes from any topic.
//!
//! ## Examples
//!
//! ```ignore
//! use streamhouse_client::ConsumerConfig;
//! use std::time::Duration;
//!
//! let mut consumer = client.subscribe("orders", "analytics", ConsumerConfig::default())?;
//!
//! while let Some(message) = consumer.receive(Duration::from_secs(1)).await? {
//!     println!("{:?} tagged {:?}", message.payload(), message.schema_version());
//! }
//! ```

use crate::binding::SchemaHandle;
use crate::envelope;
use crate::error::Result;
use crate::message::Message;
use crate::transport::Subscription;
use std::time::Duration;
use streamhouse_schema::{SchemaInfo, SchemaVersion};
use tracing::debug;

/// A schema-bound consumer
#[derive(Debug)]
pub struct Consumer {
    handle: SchemaHandle,
    subscription: Subscription,
}

impl Consumer {
    pub(crate) fn new(handle: SchemaHandle, subscription: Subscription) -> Self {
        Self {
            handle,
            subscription,
        }
    }

    pub fn topic(&self) -> &str {
        self.handle.topic()
    }

    pub fn subscription(&self) -> &str {
        self.subscription.name()
    }

    /// Schema this consumer reads with, `None` when reading raw bytes
    pub fn schema(&self) -> Option<&SchemaInfo> {
        self.handle.schema()
    }

    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.handle.version()
    }

    pub fn handle(&self) -> &SchemaHandle {
        &self.handle
    }

    /// Next message, or `None` if nothing arrives within `timeout`
    pub async fn receive(&mut self, timeout: Duration) -> Result<Option<Message>> {
        let Some(frame) = self.subscription.next_frame(timeout).await? else {
            return Ok(None);
        };

        let message = envelope::decode(&frame)?;
        debug!(
            topic = %self.topic(),
            subscription = %self.subscription(),
            version = ?message.schema_version(),
            "Received message"
        );
        Ok(Some(message))
    }
}
