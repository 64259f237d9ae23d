//! Integration tests for topic schema binding

use std::process::Command;
use std::sync::Arc;
use streamhouse_schema::*;

const USER_SCHEMA: &str = r#"{
    "type": "record",
    "name": "User",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "name", "type": "string"}
    ]
}"#;

fn user_schema() -> SchemaInfo {
    SchemaInfo::new(SchemaType::Avro, "User", USER_SCHEMA)
}

// ============================================================================
// Resolver + Registry
// ============================================================================

#[tokio::test]
async fn test_producer_then_consumer_share_version() {
    let registry = MemorySchemaRegistry::new();
    let resolver = SchemaCompatibilityResolver::new(false);

    let producer = resolver
        .resolve(&registry, "users", SchemaRole::Producer, Some(&user_schema()))
        .await
        .unwrap();
    assert_eq!(producer.version, Some(SchemaVersion::ZERO));
    assert_eq!(producer.schema, Some(user_schema()));

    // Consumers only need the type to match
    let reader = SchemaInfo::new(SchemaType::Avro, "UserReader", r#"{"type":"string"}"#);
    let consumer = resolver
        .resolve(&registry, "users", SchemaRole::Consumer, Some(&reader))
        .await
        .unwrap();
    assert_eq!(consumer.version, producer.version);
}

#[tokio::test]
async fn test_producer_definition_mismatch_rejected() {
    let registry = MemorySchemaRegistry::new();
    let resolver = SchemaCompatibilityResolver::new(false);

    resolver
        .resolve(&registry, "users", SchemaRole::Producer, Some(&user_schema()))
        .await
        .unwrap();

    let other = SchemaInfo::new(SchemaType::Avro, "User", r#"{"type":"string"}"#);
    let err = resolver
        .resolve(&registry, "users", SchemaRole::Producer, Some(&other))
        .await
        .unwrap_err();

    match err {
        SchemaError::IncompatibleSchema {
            topic,
            role,
            expected,
            actual,
            ..
        } => {
            assert_eq!(topic, "users");
            assert_eq!(role, SchemaRole::Producer);
            assert_eq!(expected, Some(SchemaType::Avro));
            assert_eq!(actual, Some(SchemaType::Avro));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_consumer_type_mismatch_rejected() {
    let registry = MemorySchemaRegistry::new();
    let resolver = SchemaCompatibilityResolver::new(false);

    resolver
        .resolve(&registry, "users", SchemaRole::Producer, Some(&user_schema()))
        .await
        .unwrap();

    let json = SchemaInfo::new(SchemaType::Json, "User", "{}");
    let result = resolver
        .resolve(&registry, "users", SchemaRole::Consumer, Some(&json))
        .await;
    assert!(matches!(result, Err(SchemaError::IncompatibleSchema { .. })));
}

#[tokio::test]
async fn test_schemaless_requests_never_touch_topic_state() {
    let registry = MemorySchemaRegistry::new();
    let lenient = SchemaCompatibilityResolver::new(false);
    let strict = SchemaCompatibilityResolver::new(true);

    let producer = lenient
        .resolve(&registry, "raw", SchemaRole::Producer, None)
        .await
        .unwrap();
    assert_eq!(producer, BindOutcome::schemaless());

    // Lenient consumer even under enforcement
    let consumer = strict
        .resolve(&registry, "raw", SchemaRole::Consumer, None)
        .await
        .unwrap();
    assert_eq!(consumer, BindOutcome::schemaless());

    let err = strict
        .resolve(&registry, "raw", SchemaRole::Producer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::IncompatibleSchema { actual: None, .. }));

    assert!(registry.topics().await.is_empty());
}

#[tokio::test]
async fn test_key_value_schema_binds_and_splits() {
    let registry = MemorySchemaRegistry::new();
    let resolver = SchemaCompatibilityResolver::new(true);

    let key = SchemaInfo::new(SchemaType::String, "id", "");
    let kv = SchemaInfo::key_value(&key, &user_schema(), KeyValueEncodingType::Separated).unwrap();

    resolver
        .resolve(&registry, "users-kv", SchemaRole::Producer, Some(&kv))
        .await
        .unwrap();

    let active = registry
        .fetch_active_schema("users-kv")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.key_value_encoding().unwrap(), KeyValueEncodingType::Separated);

    let (k, v) = active.split_key_value().unwrap();
    assert_eq!(k.schema_type(), SchemaType::String);
    assert!(k.definition().is_empty());
    assert_eq!(v, user_schema());
}

#[tokio::test]
async fn test_concurrent_producers_same_schema_all_succeed() {
    let registry = Arc::new(MemorySchemaRegistry::new());
    let resolver = SchemaCompatibilityResolver::new(true);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            resolver
                .resolve(registry.as_ref(), "shared", SchemaRole::Producer, Some(&user_schema()))
                .await
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.version, Some(SchemaVersion::ZERO));
    }
}

// ============================================================================
// schema-inspect
// ============================================================================

#[test]
fn test_inspect_encode_then_decode() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("key.json");
    let value_path = dir.path().join("value.avsc");
    let out_path = dir.path().join("kv.bin");
    std::fs::write(&key_path, "{}").unwrap();
    std::fs::write(&value_path, USER_SCHEMA).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_schema-inspect"))
        .arg("encode-kv")
        .arg("--key-file")
        .arg(&key_path)
        .args(["--key-type", "json"])
        .arg("--value-file")
        .arg(&value_path)
        .args(["--value-type", "avro"])
        .arg("--output")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let encoded = std::fs::read(&out_path).unwrap();
    assert_eq!(encoded.len(), 8 + 2 + USER_SCHEMA.len());

    let output = Command::new(env!("CARGO_BIN_EXE_schema-inspect"))
        .arg("decode-kv")
        .arg(&out_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["key_length"], 2);
    assert_eq!(summary["value_length"], USER_SCHEMA.len() as i64);
    assert_eq!(summary["key"], "{}");
}

#[test]
fn test_inspect_empty_key_prints_sentinel_hex() {
    let output = Command::new(env!("CARGO_BIN_EXE_schema-inspect"))
        .arg("encode-kv")
        .output()
        .unwrap();
    assert!(output.status.success());

    let hex = String::from_utf8(output.stdout).unwrap();
    assert_eq!(hex.trim(), "ffffffffffffffff");
}

#[test]
fn test_inspect_rejects_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.bin");
    std::fs::write(&path, [0u8, 0, 0, 5, b'a']).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_schema-inspect"))
        .arg("decode-kv")
        .arg(&path)
        .output()
        .unwrap();
    assert!(!output.status.success());
}
