//! Asynchronous Schema Binding
//!
//! Binds a producer or consumer to a topic's schema without holding the
//! caller's thread for the registry round trip.
//!
//! ## Flow
//!
//! ```text
//! bind_async(topic, role, schema?, auto_download)
//!        │
//!        ├─ spawn task on the client runtime ──────────────┐
//!        │                                                 ▼
//!        │                          timeout(operation_timeout) {
//!        │                            schema absent + auto_download?
//!        │                              └─ fetch_active_schema (retried)
//!        │                            resolver.resolve (retried)
//!        │                          }
//!        │                                                 │
//!        ▼                                                 ▼
//!   BindFuture  ◀────────────── Promise::complete(Result<SchemaHandle>)
//! ```
//!
//! The outcome is written exactly once. Dropping a `BindFuture` abandons the
//! wait but not the task: a registry-side bind that completes afterwards
//! stays in place.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::promise::{BrokenPromise, Promise, PromiseFuture};
use crate::retry::{retry_with_backoff, RetryPolicy};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use streamhouse_schema::{
    SchemaCompatibilityResolver, SchemaInfo, SchemaRegistry, SchemaRole, SchemaVersion,
};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

/// A successful binding: what the producer or consumer is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaHandle {
    topic: String,
    role: SchemaRole,
    schema: Option<SchemaInfo>,
    version: Option<SchemaVersion>,
}

impl SchemaHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn role(&self) -> SchemaRole {
        self.role
    }

    /// Effective schema, `None` for a schemaless binding
    pub fn schema(&self) -> Option<&SchemaInfo> {
        self.schema.as_ref()
    }

    /// Version to tag messages with, `None` for a schemaless binding
    pub fn version(&self) -> Option<SchemaVersion> {
        self.version
    }

    pub fn is_schemaless(&self) -> bool {
        self.version.is_none()
    }
}

type Outcome = Result<SchemaHandle>;

/// Block the calling thread on a client future
///
/// From a plain thread this blocks directly. On a multi-thread runtime worker
/// the worker's queued tasks are handed off first. A current-thread runtime
/// cannot make progress while its only thread is blocked, so that case is
/// refused with `ConfigError`.
pub(crate) fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match Handle::try_current() {
        Err(_) => futures::executor::block_on(future),
        Ok(current) => match current.runtime_flavor() {
            RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| futures::executor::block_on(future))
            }
            _ => Err(ClientError::ConfigError(
                "blocking call made from a current-thread runtime; use the async variant"
                    .to_string(),
            )),
        },
    }
}

fn settle(result: std::result::Result<Outcome, BrokenPromise>) -> Outcome {
    result.unwrap_or_else(|e| Err(ClientError::Internal(format!("Schema binding task ended: {}", e))))
}

/// Pending outcome of `SchemaBinding::bind_async`
///
/// Await it, poll it with `try_get`, or block a plain thread on it with
/// `wait_blocking`.
pub struct BindFuture {
    promise: PromiseFuture<Outcome>,
    wait: BoxFuture<'static, Outcome>,
}

impl BindFuture {
    fn new(promise: PromiseFuture<Outcome>) -> Self {
        let waiter = promise.clone();
        Self {
            promise,
            wait: async move { settle(waiter.wait().await) }.boxed(),
        }
    }

    /// The outcome if the binding has finished
    pub fn try_get(&self) -> Option<Outcome> {
        self.promise.try_get()
    }

    pub fn is_done(&self) -> bool {
        self.promise.is_completed()
    }

    /// Block the current thread until the binding finishes
    ///
    /// Same thread rules as `SchemaBinding::bind`.
    pub fn wait_blocking(self) -> Outcome {
        block_on(self)
    }
}

impl Future for BindFuture {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.wait.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for BindFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindFuture")
            .field("done", &self.is_done())
            .finish()
    }
}

/// Orchestrates schema binding for producers and consumers
#[derive(Clone)]
pub struct SchemaBinding {
    registry: Arc<dyn SchemaRegistry>,
    resolver: SchemaCompatibilityResolver,
    retry: RetryPolicy,
    operation_timeout: Duration,
    auto_download: bool,
    runtime: Handle,
}

impl SchemaBinding {
    pub fn new(registry: Arc<dyn SchemaRegistry>, config: &ClientConfig, runtime: Handle) -> Self {
        Self {
            registry,
            resolver: SchemaCompatibilityResolver::new(config.schema_validation_enforced),
            retry: config.registry_retry.clone(),
            operation_timeout: config.operation_timeout,
            auto_download: config.auto_download_schema,
            runtime,
        }
    }

    /// Start binding and return immediately
    ///
    /// With no declared schema and `auto_download` set, the topic's bound
    /// schema (if any) is fetched and used as the declared schema.
    pub fn bind_async(
        &self,
        topic: &str,
        role: SchemaRole,
        schema: Option<SchemaInfo>,
        auto_download: bool,
    ) -> BindFuture {
        let promise = Promise::new();
        let future = BindFuture::new(promise.future());

        let binding = self.clone();
        let topic = topic.to_string();
        self.runtime.spawn(async move {
            let outcome = binding.run(&topic, role, schema, auto_download).await;
            // The only writer; a rejection here is logged by the promise
            let _ = promise.complete(outcome);
        });

        future
    }

    /// Bind and block the calling thread until the outcome is known
    ///
    /// Auto-download follows the client configuration. Fails with
    /// `ConfigError` on a current-thread runtime; async callers use
    /// `bind_async`.
    pub fn bind(&self, topic: &str, role: SchemaRole, schema: Option<SchemaInfo>) -> Result<SchemaHandle> {
        self.bind_async(topic, role, schema, self.auto_download)
            .wait_blocking()
    }

    async fn run(
        &self,
        topic: &str,
        role: SchemaRole,
        schema: Option<SchemaInfo>,
        auto_download: bool,
    ) -> Result<SchemaHandle> {
        let negotiate = self.negotiate(topic, role, schema, auto_download);
        match tokio::time::timeout(self.operation_timeout, negotiate).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    topic = %topic,
                    role = %role,
                    timeout_ms = self.operation_timeout.as_millis(),
                    "Schema binding timed out"
                );
                Err(ClientError::Timeout(self.operation_timeout))
            }
        }
    }

    async fn negotiate(
        &self,
        topic: &str,
        role: SchemaRole,
        declared: Option<SchemaInfo>,
        auto_download: bool,
    ) -> Result<SchemaHandle> {
        let registry = self.registry.as_ref();

        let declared = match declared {
            Some(schema) => Some(schema),
            None if auto_download => {
                let fetched = retry_with_backoff(&self.retry, || async move {
                    registry
                        .fetch_active_schema(topic)
                        .await
                        .map_err(ClientError::from)
                })
                .await?;
                match &fetched {
                    Some(schema) => debug!(
                        topic = %topic,
                        schema_type = %schema.schema_type(),
                        "Using topic schema from registry"
                    ),
                    None => debug!(topic = %topic, "Topic has no schema, binding schemaless"),
                }
                fetched
            }
            None => None,
        };

        let resolver = self.resolver;
        let declared_ref = declared.as_ref();
        let outcome = retry_with_backoff(&self.retry, || async move {
            resolver
                .resolve(registry, topic, role, declared_ref)
                .await
                .map_err(ClientError::from)
        })
        .await?;

        info!(
            topic = %topic,
            role = %role,
            version = ?outcome.version,
            "Schema binding established"
        );

        Ok(SchemaHandle {
            topic: topic.to_string(),
            role,
            schema: outcome.schema,
            version: outcome.version,
        })
    }
}
