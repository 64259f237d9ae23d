//! Schema Registry Collaborator
//!
//! The registry owns every topic's binding state and serializes the decisions
//! that change it. Clients never mutate topic state directly; they send a
//! check-or-bind request and act on the verdict.

use crate::{
    compatibility::{evaluate, Resolution, TopicBinding},
    error::{Result, SchemaError},
    types::{SchemaInfo, SchemaRole, SchemaType, SchemaVersion},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Registry round trips used by schema binding
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Check a binding request against the topic and bind it if the topic is unbound
    ///
    /// Returns the version the client must tag its messages with, or `None`
    /// when the binding is schemaless.
    async fn check_or_bind(
        &self,
        topic: &str,
        role: SchemaRole,
        schema: Option<&SchemaInfo>,
        validation_enforced: bool,
    ) -> Result<Option<SchemaVersion>>;

    /// Get the schema currently bound to a topic, `None` when unbound
    async fn fetch_active_schema(&self, topic: &str) -> Result<Option<SchemaInfo>>;
}

/// In-memory schema registry
///
/// Stores topic bindings in a HashMap behind a single async mutex, so every
/// decision sees a consistent snapshot and decisions on a topic are totally
/// ordered. Suitable for development, testing, and single-process deployments.
#[derive(Default)]
pub struct MemorySchemaRegistry {
    topics: Mutex<HashMap<String, TopicBinding>>,
}

impl MemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding of a topic
    pub async fn binding(&self, topic: &str) -> TopicBinding {
        let topics = self.topics.lock().await;
        topics.get(topic).cloned().unwrap_or_default()
    }

    /// Topics with a bound schema, sorted
    pub async fn topics(&self) -> Vec<String> {
        let topics = self.topics.lock().await;
        let mut names: Vec<String> = topics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Forget a topic's schema; the topic is unbound afterwards
    pub async fn delete_topic(&self, topic: &str) -> Option<TopicBinding> {
        let removed = self.topics.lock().await.remove(topic);
        if removed.is_some() {
            info!(topic = %topic, "Topic schema deleted");
        }
        removed
    }

    /// Validate schema syntax before it is bound
    fn validate_schema(schema: &SchemaInfo) -> Result<()> {
        if schema.definition().is_empty() {
            return Ok(());
        }

        match schema.schema_type() {
            SchemaType::Avro => {
                apache_avro::Schema::parse_str(&schema.definition_str()).map_err(|e| {
                    SchemaError::InvalidSchema(format!("Invalid Avro schema: {}", e))
                })?;
            }
            SchemaType::Json => {
                let _: serde_json::Value =
                    serde_json::from_slice(schema.definition()).map_err(|e| {
                        SchemaError::InvalidSchema(format!("Invalid JSON schema: {}", e))
                    })?;
            }
            SchemaType::KeyValue => {
                let (key, value) = schema.split_key_value()?;
                Self::validate_schema(&key)?;
                Self::validate_schema(&value)?;
            }
            _ => {}
        }

        Ok(())
    }
}

#[async_trait]
impl SchemaRegistry for MemorySchemaRegistry {
    async fn check_or_bind(
        &self,
        topic: &str,
        role: SchemaRole,
        schema: Option<&SchemaInfo>,
        validation_enforced: bool,
    ) -> Result<Option<SchemaVersion>> {
        let mut topics = self.topics.lock().await;

        let resolution = match topics.get(topic) {
            Some(state) => evaluate(topic, state, role, schema, validation_enforced)?,
            None => evaluate(topic, &TopicBinding::Unbound, role, schema, validation_enforced)?,
        };

        match resolution {
            Resolution::Register(schema) => {
                Self::validate_schema(&schema)?;

                // First schema on a topic
                let version = SchemaVersion::ZERO;
                info!(
                    topic = %topic,
                    role = %role,
                    schema_type = %schema.schema_type(),
                    version = %version,
                    "Schema bound to topic"
                );
                topics.insert(topic.to_string(), TopicBinding::Bound { schema, version });
                Ok(Some(version))
            }
            Resolution::Existing(version) => {
                debug!(topic = %topic, role = %role, version = %version, "Schema compatible");
                Ok(Some(version))
            }
            Resolution::Schemaless => {
                debug!(topic = %topic, role = %role, "Schemaless binding accepted");
                Ok(None)
            }
        }
    }

    async fn fetch_active_schema(&self, topic: &str) -> Result<Option<SchemaInfo>> {
        let topics = self.topics.lock().await;
        Ok(topics.get(topic).and_then(|b| b.schema().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyValueEncodingType;
    use std::sync::Arc;

    const EXAMPLE_SCHEMA: &str = r#"{"type":"record","name":"Example","namespace":"test","fields":[{"name":"a","type":"int"},{"name":"b","type":"int"}]}"#;

    fn avro() -> SchemaInfo {
        SchemaInfo::new(SchemaType::Avro, "Avro", EXAMPLE_SCHEMA)
    }

    #[tokio::test]
    async fn test_first_bind_issues_version_zero() {
        let registry = MemorySchemaRegistry::new();

        let version = registry
            .check_or_bind("topic-avro", SchemaRole::Producer, Some(&avro()), true)
            .await
            .unwrap();
        assert_eq!(version, Some(SchemaVersion::ZERO));

        let binding = registry.binding("topic-avro").await;
        assert_eq!(binding.schema(), Some(&avro()));
        assert_eq!(registry.topics().await, vec!["topic-avro".to_string()]);
    }

    #[tokio::test]
    async fn test_rebind_same_schema_returns_existing_version() {
        let registry = MemorySchemaRegistry::new();
        let first = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&avro()), true)
            .await
            .unwrap();
        let second = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&avro()), true)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_incompatible_request_leaves_state_untouched() {
        let registry = MemorySchemaRegistry::new();
        registry
            .check_or_bind("t", SchemaRole::Producer, Some(&avro()), true)
            .await
            .unwrap();

        let json = SchemaInfo::new(SchemaType::Json, "Json", "{}");
        let result = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&json), true)
            .await;
        assert!(matches!(result, Err(SchemaError::IncompatibleSchema { .. })));
        assert_eq!(registry.fetch_active_schema("t").await.unwrap(), Some(avro()));
    }

    #[tokio::test]
    async fn test_schemaless_producer_does_not_bind() {
        let registry = MemorySchemaRegistry::new();
        let version = registry
            .check_or_bind("t", SchemaRole::Producer, None, false)
            .await
            .unwrap();
        assert_eq!(version, None);
        assert_eq!(registry.binding("t").await, TopicBinding::Unbound);
        assert!(registry.topics().await.is_empty());
    }

    #[tokio::test]
    async fn test_consumer_binds_unbound_topic() {
        let registry = MemorySchemaRegistry::new();
        let json = SchemaInfo::new(SchemaType::Json, "test-schema", "{}");
        registry
            .check_or_bind("t", SchemaRole::Consumer, Some(&json), false)
            .await
            .unwrap();
        assert_eq!(registry.fetch_active_schema("t").await.unwrap(), Some(json));
    }

    #[tokio::test]
    async fn test_fetch_active_schema_unbound() {
        let registry = MemorySchemaRegistry::new();
        assert_eq!(registry.fetch_active_schema("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_topic_unbinds() {
        let registry = MemorySchemaRegistry::new();
        registry
            .check_or_bind("t", SchemaRole::Producer, Some(&avro()), true)
            .await
            .unwrap();

        assert!(registry.delete_topic("t").await.is_some());
        assert!(registry.delete_topic("t").await.is_none());

        // A topic created afresh accepts a different schema
        let json = SchemaInfo::new(SchemaType::Json, "Json", "{}");
        let version = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&json), true)
            .await
            .unwrap();
        assert_eq!(version, Some(SchemaVersion::ZERO));
    }

    #[tokio::test]
    async fn test_invalid_avro_rejected() {
        let registry = MemorySchemaRegistry::new();
        let bad = SchemaInfo::new(SchemaType::Avro, "Avro", r#"{"type": "unknown_type"}"#);
        let result = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&bad), true)
            .await;
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
        assert_eq!(registry.binding("t").await, TopicBinding::Unbound);
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let registry = MemorySchemaRegistry::new();
        let bad = SchemaInfo::new(SchemaType::Json, "Json", "not valid json");
        let result = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&bad), true)
            .await;
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
    }

    #[tokio::test]
    async fn test_empty_definitions_are_not_validated() {
        let registry = MemorySchemaRegistry::new();
        let string = SchemaInfo::new(SchemaType::String, "String", "");
        assert!(registry
            .check_or_bind("t", SchemaRole::Producer, Some(&string), true)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_key_value_constituents_validated() {
        let registry = MemorySchemaRegistry::new();

        let key = SchemaInfo::new(SchemaType::String, "key", "");
        let kv = SchemaInfo::key_value(&key, &avro(), KeyValueEncodingType::Inline).unwrap();
        assert!(registry
            .check_or_bind("good", SchemaRole::Producer, Some(&kv), true)
            .await
            .is_ok());

        let bad_value = SchemaInfo::new(SchemaType::Json, "value", "{");
        let kv = SchemaInfo::key_value(&key, &bad_value, KeyValueEncodingType::Inline).unwrap();
        let result = registry
            .check_or_bind("bad", SchemaRole::Producer, Some(&kv), true)
            .await;
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
    }

    #[tokio::test]
    async fn test_malformed_key_value_rejected() {
        let registry = MemorySchemaRegistry::new();
        let kv = SchemaInfo::new(SchemaType::KeyValue, "KeyValue", vec![0u8, 0, 0, 9, 1]);
        let result = registry
            .check_or_bind("t", SchemaRole::Producer, Some(&kv), true)
            .await;
        assert!(matches!(result, Err(SchemaError::MalformedSchema(_))));
    }

    #[tokio::test]
    async fn test_racing_first_binders_one_wins() {
        let registry = Arc::new(MemorySchemaRegistry::new());
        let json = SchemaInfo::new(SchemaType::Json, "Json", "{}");

        let r1 = Arc::clone(&registry);
        let a = tokio::spawn(async move {
            r1.check_or_bind("race", SchemaRole::Producer, Some(&avro()), true)
                .await
        });
        let r2 = Arc::clone(&registry);
        let b = tokio::spawn(async move {
            r2.check_or_bind("race", SchemaRole::Producer, Some(&json), true)
                .await
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(registry.binding("race").await.is_bound());
    }
}
