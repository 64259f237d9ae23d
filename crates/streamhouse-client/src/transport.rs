//! Message Transport
//!
//! Moves encoded message frames between producers and consumers. Connection
//! management, batching and delivery guarantees belong to the transport
//! implementation; schema binding only needs publish and subscribe.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Publish/subscribe transport for encoded message frames
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a frame to every subscription of a topic
    async fn publish(&self, topic: &str, frame: Bytes) -> Result<()>;

    /// Open a named subscription on a topic
    async fn subscribe(&self, topic: &str, subscription: &str) -> Result<Subscription>;
}

/// Receiving end of a subscription
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    name: String,
    rx: mpsc::UnboundedReceiver<Bytes>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, name: impl Into<String>, rx: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            name: name.into(),
            rx,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next frame, or `None` if nothing arrives within `timeout`
    pub async fn next_frame(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => Err(ClientError::SubscriptionClosed(self.name.clone())),
            Err(_) => Ok(None),
        }
    }
}

/// In-process transport
///
/// Fans each published frame out to the subscriptions open on the topic at
/// publish time. Frames published to a topic with no subscriptions are
/// dropped. Opening a subscription under an existing name replaces it.
#[derive(Default)]
pub struct MemoryTransport {
    topics: Mutex<HashMap<String, HashMap<String, mpsc::UnboundedSender<Bytes>>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open subscriptions on a topic
    pub async fn subscription_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().await;
        topics.get(topic).map(|subs| subs.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(&self, topic: &str, frame: Bytes) -> Result<()> {
        let mut topics = self.topics.lock().await;
        if let Some(subscriptions) = topics.get_mut(topic) {
            // Drop subscriptions whose consumer has gone away
            subscriptions.retain(|_, tx| tx.send(frame.clone()).is_ok());
            debug!(topic = %topic, subscriptions = subscriptions.len(), size = frame.len(), "Frame published");
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, subscription: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_string())
            .or_default()
            .insert(subscription.to_string(), tx);
        debug!(topic = %topic, subscription = %subscription, "Subscription opened");
        Ok(Subscription::new(topic, subscription, rx))
    }
}
