//! Core Schema Types

use crate::error::SchemaError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Schema type carried alongside a schema definition
///
/// The numeric codes are the ones used on the wire by the messaging protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    /// No schema, raw bytes
    None,
    String,
    Json,
    Protobuf,
    Avro,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    /// Composite of a key schema and a value schema
    KeyValue,
    ProtobufNative,
    Bytes,
}

impl SchemaType {
    pub const ALL: [SchemaType; 15] = [
        SchemaType::None,
        SchemaType::String,
        SchemaType::Json,
        SchemaType::Protobuf,
        SchemaType::Avro,
        SchemaType::Boolean,
        SchemaType::Int8,
        SchemaType::Int16,
        SchemaType::Int32,
        SchemaType::Int64,
        SchemaType::Float,
        SchemaType::Double,
        SchemaType::KeyValue,
        SchemaType::ProtobufNative,
        SchemaType::Bytes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::None => "NONE",
            SchemaType::String => "STRING",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
            SchemaType::Avro => "AVRO",
            SchemaType::Boolean => "BOOLEAN",
            SchemaType::Int8 => "INT8",
            SchemaType::Int16 => "INT16",
            SchemaType::Int32 => "INT32",
            SchemaType::Int64 => "INT64",
            SchemaType::Float => "FLOAT",
            SchemaType::Double => "DOUBLE",
            SchemaType::KeyValue => "KEY_VALUE",
            SchemaType::ProtobufNative => "PROTOBUF_NATIVE",
            SchemaType::Bytes => "BYTES",
        }
    }

    /// Wire code of this schema type
    pub fn code(&self) -> i32 {
        match self {
            SchemaType::None => 0,
            SchemaType::String => 1,
            SchemaType::Json => 2,
            SchemaType::Protobuf => 3,
            SchemaType::Avro => 4,
            SchemaType::Boolean => 5,
            SchemaType::Int8 => 6,
            SchemaType::Int16 => 7,
            SchemaType::Int32 => 8,
            SchemaType::Int64 => 9,
            SchemaType::Float => 10,
            SchemaType::Double => 11,
            SchemaType::KeyValue => 15,
            SchemaType::ProtobufNative => 20,
            SchemaType::Bytes => -1,
        }
    }

    pub fn from_code(code: i32) -> Option<SchemaType> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| SchemaError::InvalidSchema(format!("Unknown schema type: {}", s)))
    }
}

/// Which side of a topic a binding request comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRole {
    Producer,
    Consumer,
}

impl SchemaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaRole::Producer => "producer",
            SchemaRole::Consumer => "consumer",
        }
    }
}

impl fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the two halves of a key/value schema travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyValueEncodingType {
    /// Key and value schemas are both inside the composite definition
    #[default]
    Inline,
    /// Key and value schemas travel out-of-band
    Separated,
}

impl KeyValueEncodingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyValueEncodingType::Inline => "INLINE",
            KeyValueEncodingType::Separated => "SEPARATED",
        }
    }
}

impl FromStr for KeyValueEncodingType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INLINE" => Ok(KeyValueEncodingType::Inline),
            "SEPARATED" => Ok(KeyValueEncodingType::Separated),
            other => Err(SchemaError::InvalidSchema(format!(
                "Unknown key/value encoding type: {}",
                other
            ))),
        }
    }
}

/// Opaque 8-byte version assigned by the registry when a schema is bound
///
/// The first schema bound to a topic gets the all-zero version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SchemaVersion([u8; 8]);

impl SchemaVersion {
    pub const LEN: usize = 8;

    /// Version carried while the first-registered schema is unchanged
    pub const ZERO: SchemaVersion = SchemaVersion([0; 8]);

    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Big-endian encoding of a numeric version
    pub fn from_u64(version: u64) -> Self {
        Self(version.to_be_bytes())
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Parse a version tag; anything but exactly 8 bytes is rejected
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 8]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 8]
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Immutable description of one schema
///
/// An empty `definition` is valid and means "no structural schema".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    schema_type: SchemaType,
    name: String,
    definition: Bytes,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl SchemaInfo {
    pub fn new(schema_type: SchemaType, name: impl Into<String>, definition: impl Into<Bytes>) -> Self {
        Self::with_properties(schema_type, name, definition, BTreeMap::new())
    }

    pub fn with_properties(
        schema_type: SchemaType,
        name: impl Into<String>,
        definition: impl Into<Bytes>,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            schema_type,
            name: name.into(),
            definition: definition.into(),
            properties,
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw definition bytes (cheap to clone)
    pub fn definition(&self) -> &Bytes {
        &self.definition
    }

    /// Lossy UTF-8 view of the definition, for logs and tooling
    pub fn definition_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.definition)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_key_value(&self) -> bool {
        self.schema_type == SchemaType::KeyValue
    }
}
