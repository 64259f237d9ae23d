//! Client Facade
//!
//! Entry point for creating schema-bound producers and consumers.
//!
//! ## Examples
//!
//! ```ignore
//! use std::sync::Arc;
//! use streamhouse_client::{Client, ClientConfig, ProducerConfig};
//! use streamhouse_schema::MemorySchemaRegistry;
//!
//! let client = Client::builder()
//!     .registry(Arc::new(MemorySchemaRegistry::new()))
//!     .config(ClientConfig::from_env())
//!     .build()?;
//!
//! // From async code
//! let producer = client
//!     .create_producer_async("orders", ProducerConfig::default(), true)
//!     .await?;
//!
//! // From a plain thread or a multi-thread runtime worker
//! let producer = client.create_producer("orders", ProducerConfig::default())?;
//! ```

use crate::binding::{block_on, SchemaBinding};
use crate::config::{ClientConfig, ConsumerConfig, ProducerConfig};
use crate::consumer::Consumer;
use crate::error::{ClientError, Result};
use crate::producer::Producer;
use crate::transport::{MemoryTransport, Transport};
use std::future::Future;
use std::sync::Arc;
use streamhouse_schema::{SchemaRegistry, SchemaRole};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// StreamHouse client
///
/// Cheap to clone; clones share the registry, transport and runtime.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    binding: SchemaBinding,
    transport: Arc<dyn Transport>,
    runtime: Handle,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a producer, blocking the calling thread until its schema is bound
    ///
    /// Auto-download follows `ClientConfig::auto_download_schema`. Fails with
    /// `ConfigError` when called on a current-thread runtime.
    pub fn create_producer(&self, topic: &str, config: ProducerConfig) -> Result<Producer> {
        let auto_download = self.config.auto_download_schema;
        block_on(self.create_producer_async(topic, config, auto_download))
    }

    /// Start creating a producer
    ///
    /// The binding starts immediately; the returned future only waits for it.
    pub fn create_producer_async(
        &self,
        topic: &str,
        config: ProducerConfig,
        auto_download: bool,
    ) -> impl Future<Output = Result<Producer>> + Send + 'static {
        let bind = self
            .binding
            .bind_async(topic, SchemaRole::Producer, config.schema, auto_download);
        let transport = Arc::clone(&self.transport);
        let name = config.name;

        async move {
            let handle = bind.await?;
            let producer = Producer::new(handle, transport, name);
            info!(
                producer = %producer.name(),
                topic = %producer.topic(),
                version = ?producer.schema_version(),
                "Producer created"
            );
            Ok(producer)
        }
    }

    /// Subscribe, blocking the calling thread until the consumer is ready
    pub fn subscribe(
        &self,
        topic: &str,
        subscription: &str,
        config: ConsumerConfig,
    ) -> Result<Consumer> {
        block_on(self.subscribe_async(topic, subscription, config))
    }

    /// Start subscribing
    ///
    /// The binding and the transport subscription run on the client runtime,
    /// together bounded by `operation_timeout`.
    pub fn subscribe_async(
        &self,
        topic: &str,
        subscription: &str,
        config: ConsumerConfig,
    ) -> impl Future<Output = Result<Consumer>> + Send + 'static {
        let auto_download = config
            .auto_download_schema
            .unwrap_or(self.config.auto_download_schema);
        let bind = self
            .binding
            .bind_async(topic, SchemaRole::Consumer, config.schema, auto_download);
        let transport = Arc::clone(&self.transport);
        let topic = topic.to_string();
        let subscription = subscription.to_string();
        let operation_timeout = self.config.operation_timeout;

        let task = self.runtime.spawn(async move {
            let create = async {
                let handle = bind.await?;
                let subscription = transport.subscribe(&topic, &subscription).await?;
                info!(
                    topic = %topic,
                    subscription = %subscription.name(),
                    version = ?handle.version(),
                    "Consumer created"
                );
                Ok::<_, ClientError>(Consumer::new(handle, subscription))
            };

            match tokio::time::timeout(operation_timeout, create).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        topic = %topic,
                        subscription = %subscription,
                        timeout_ms = operation_timeout.as_millis(),
                        "Subscribe timed out"
                    );
                    Err(ClientError::Timeout(operation_timeout))
                }
            }
        });

        async move {
            task.await
                .map_err(|e| ClientError::Internal(format!("Subscribe task failed: {}", e)))?
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish()
    }
}

/// Builder for `Client`
///
/// `registry` is required. The transport defaults to an in-process
/// `MemoryTransport` and the runtime to the one the builder runs in.
#[derive(Default)]
pub struct ClientBuilder {
    registry: Option<Arc<dyn SchemaRegistry>>,
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
    runtime: Option<Handle>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema registry (required).
    pub fn registry(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Runtime that binding tasks are spawned on.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Client> {
        let registry = self
            .registry
            .ok_or_else(|| ClientError::ConfigError("registry is required".to_string()))?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                ClientError::ConfigError(format!(
                    "no runtime given and none running: {}",
                    e
                ))
            })?,
        };

        if self.config.operation_timeout.is_zero() {
            return Err(ClientError::ConfigError(
                "operation_timeout must be greater than zero".to_string(),
            ));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(MemoryTransport::new()),
        };
        let binding = SchemaBinding::new(registry, &self.config, runtime.clone());

        info!(
            operation_timeout_ms = self.config.operation_timeout.as_millis(),
            schema_validation_enforced = self.config.schema_validation_enforced,
            auto_download_schema = self.config.auto_download_schema,
            "Client initialized"
        );

        Ok(Client {
            config: self.config,
            binding,
            transport,
            runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Subscription;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;
    use streamhouse_schema::{MemorySchemaRegistry, SchemaInfo, SchemaType};

    /// Accepts publishes but never finishes opening a subscription
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn publish(&self, _topic: &str, _frame: Bytes) -> Result<()> {
            Ok(())
        }

        async fn subscribe(&self, _topic: &str, _subscription: &str) -> Result<Subscription> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ClientError::Internal("unreachable".to_string()))
        }
    }

    fn avro() -> SchemaInfo {
        SchemaInfo::new(SchemaType::Avro, "Avro", r#"{"type":"string"}"#)
    }

    #[test]
    fn test_build_requires_registry() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = Client::builder().runtime(runtime.handle().clone()).build();
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test]
    fn test_build_requires_runtime() {
        let result = Client::builder()
            .registry(Arc::new(MemorySchemaRegistry::new()))
            .build();
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_build_uses_current_runtime() {
        let client = Client::builder()
            .registry(Arc::new(MemorySchemaRegistry::new()))
            .build()
            .unwrap();
        assert_eq!(client.config(), &ClientConfig::default());
    }

    #[tokio::test]
    async fn test_build_rejects_zero_timeout() {
        let result = Client::builder()
            .registry(Arc::new(MemorySchemaRegistry::new()))
            .config(ClientConfig {
                operation_timeout: Duration::ZERO,
                ..ClientConfig::default()
            })
            .build();
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    // ========================================================================
    // Operation timeout
    // ========================================================================

    #[tokio::test]
    async fn test_subscribe_times_out_on_stalled_transport() {
        let timeout = Duration::from_millis(50);
        let client = Client::builder()
            .registry(Arc::new(MemorySchemaRegistry::new()))
            .transport(Arc::new(StalledTransport))
            .config(ClientConfig {
                operation_timeout: timeout,
                ..ClientConfig::default()
            })
            .build()
            .unwrap();

        let result = client
            .subscribe_async("orders", "sub", ConsumerConfig::default())
            .await;
        assert_eq!(result.unwrap_err(), ClientError::Timeout(timeout));
    }

    // ========================================================================
    // Blocking creation
    // ========================================================================

    #[tokio::test]
    async fn test_sync_create_refused_on_current_thread_runtime() {
        let client = Client::builder()
            .registry(Arc::new(MemorySchemaRegistry::new()))
            .build()
            .unwrap();

        let producer = client.create_producer("orders", ProducerConfig::with_schema(avro()));
        assert!(matches!(producer, Err(ClientError::ConfigError(_))));

        let consumer = client.subscribe("orders", "sub", ConsumerConfig::default());
        assert!(matches!(consumer, Err(ClientError::ConfigError(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sync_create_on_runtime_worker() {
        let client = Client::builder()
            .registry(Arc::new(MemorySchemaRegistry::new()))
            .build()
            .unwrap();

        let producer = tokio::spawn(async move {
            client.create_producer("orders", ProducerConfig::with_schema(avro()))
        })
        .await
        .unwrap()
        .unwrap();
        assert!(producer.schema_version().is_some());
    }
}
