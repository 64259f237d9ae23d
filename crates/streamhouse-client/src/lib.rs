//! StreamHouse Client - Schema-bound Producer and Consumer APIs
//!
//! This crate binds producers and consumers to a topic's schema before any
//! message flows. Binding runs as a task on the client runtime and completes
//! a single-assignment promise; callers await it or block a plain thread on
//! it. Every message a bound producer sends carries the binding's 8-byte
//! schema version.
//!
//! # Examples
//!
//! ## Producer
//!
//! ```ignore
//! use streamhouse_client::{Client, Message, ProducerConfig};
//! use streamhouse_schema::{SchemaInfo, SchemaType};
//!
//! let schema = SchemaInfo::new(SchemaType::Avro, "Order", order_schema);
//! let producer = client
//!     .create_producer_async("orders", ProducerConfig::with_schema(schema), false)
//!     .await?;
//!
//! producer.send(Message::builder().key("user123").payload(bytes).build()).await?;
//! ```
//!
//! ## Consumer
//!
//! ```ignore
//! use streamhouse_client::ConsumerConfig;
//!
//! let mut consumer = client
//!     .subscribe_async("orders", "analytics", ConsumerConfig::default())
//!     .await?;
//!
//! while let Some(message) = consumer.receive(Duration::from_secs(1)).await? {
//!     println!("version {:?}", message.schema_version());
//! }
//! ```

pub mod binding;
pub mod client;
pub mod config;
pub mod consumer;
pub mod envelope;
pub mod error;
pub mod message;
pub mod producer;
pub mod promise;
pub mod retry;
pub mod transport;

pub use binding::{BindFuture, SchemaBinding, SchemaHandle};
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ConsumerConfig, ProducerConfig};
pub use consumer::Consumer;
pub use error::{ClientError, Result};
pub use message::{Message, MessageBuilder};
pub use producer::Producer;
pub use promise::{BrokenPromise, Promise, PromiseFuture};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use transport::{MemoryTransport, Subscription, Transport};
