//! Schema Binding Example
//!
//! Binds an AVRO producer to a fresh topic, then shows how the topic's schema
//! policy treats other clients:
//!
//! 1. A producer with a different schema type is rejected
//! 2. A schemaless consumer is accepted
//! 3. A consumer with auto-download adopts the topic's schema
//!
//! ```bash
//! RUST_LOG=debug cargo run -p streamhouse-client --example schema_binding
//! ```

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use streamhouse_client::{Client, ClientConfig, ConsumerConfig, Message, ProducerConfig};
use streamhouse_schema::{MemorySchemaRegistry, SchemaInfo, SchemaType};
use tracing_subscriber::EnvFilter;

const ORDER_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Order",
    "fields": [
        {"name": "order_id", "type": "string"},
        {"name": "amount", "type": "double"}
    ]
}"#;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = Client::builder()
        .registry(Arc::new(MemorySchemaRegistry::new()))
        .config(ClientConfig::from_env())
        .build()?;

    let schema = SchemaInfo::new(SchemaType::Avro, "Order", ORDER_SCHEMA);
    let producer = client
        .create_producer_async("orders", ProducerConfig::with_schema(schema), false)
        .await?;
    println!("producer bound at version {:?}", producer.schema_version());

    let json = SchemaInfo::new(SchemaType::Json, "Order", "{}");
    match client
        .create_producer_async("orders", ProducerConfig::with_schema(json), false)
        .await
    {
        Ok(_) => println!("unexpected: JSON producer accepted"),
        Err(e) => println!("JSON producer rejected: {}", e),
    }

    let raw = client
        .subscribe_async("orders", "raw", ConsumerConfig::default())
        .await?;
    println!("schemaless consumer accepted, schema = {:?}", raw.schema().map(|s| s.name()));

    let mut typed = client
        .subscribe_async(
            "orders",
            "typed",
            ConsumerConfig {
                schema: None,
                auto_download_schema: Some(true),
            },
        )
        .await?;
    println!(
        "auto-download consumer adopted {:?}",
        typed.schema().map(|s| s.schema_type())
    );

    producer
        .send(Message::builder().key("order-1").payload("avro bytes").build())
        .await?;

    if let Some(message) = typed.receive(Duration::from_secs(1)).await? {
        println!("received message tagged {:?}", message.schema_version());
    }

    Ok(())
}
