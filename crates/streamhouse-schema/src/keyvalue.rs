//! Key/Value Schema Codec
//!
//! Packs the definitions of a key schema and a value schema into the single
//! definition of a `KEY_VALUE` schema, and unpacks it again.
//!
//! Format: [key_len(4)][key(N)][value_len(4)][value(M)]
//!
//! Lengths are big-endian signed 32-bit integers. A length of `-1` marks an
//! empty half and is followed by no bytes, so the composite is always exactly
//! `8 + N + M` bytes long. There is no trailer and no checksum.

use crate::{
    error::{Result, SchemaError},
    types::{KeyValueEncodingType, SchemaInfo, SchemaType},
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;

/// Length value written for an empty half
const EMPTY_LENGTH: i32 = -1;

/// Two length fields, always present
pub const HEADER_LEN: usize = 8;

pub const KEY_VALUE_SCHEMA_NAME: &str = "KeyValue";
pub const PROP_ENCODING_TYPE: &str = "kv.encoding.type";
pub const PROP_KEY_NAME: &str = "key.schema.name";
pub const PROP_KEY_TYPE: &str = "key.schema.type";
pub const PROP_KEY_PROPERTIES: &str = "key.schema.properties";
pub const PROP_VALUE_NAME: &str = "value.schema.name";
pub const PROP_VALUE_TYPE: &str = "value.schema.type";
pub const PROP_VALUE_PROPERTIES: &str = "value.schema.properties";

/// Decoded halves of a composite definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueParts {
    key: Bytes,
    value: Bytes,
    key_length: Option<u32>,
    value_length: Option<u32>,
}

impl KeyValueParts {
    /// Key definition (empty when the key length field was -1)
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Value definition (empty when the value length field was -1)
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Length fields as read from the wire, `None` for the -1 sentinel
    pub fn lengths(&self) -> (Option<u32>, Option<u32>) {
        (self.key_length, self.value_length)
    }

    pub fn into_parts(self) -> (Bytes, Bytes) {
        (self.key, self.value)
    }
}

/// Write one length field; `None` becomes the -1 sentinel
pub fn write_length<B: BufMut>(buf: &mut B, length: Option<u32>) -> Result<()> {
    let raw = match length {
        None => EMPTY_LENGTH,
        Some(len) => i32::try_from(len).map_err(|_| {
            SchemaError::MalformedSchema(format!(
                "Schema definition of {} bytes does not fit a 32-bit length field",
                len
            ))
        })?,
    };
    buf.put_i32(raw);
    Ok(())
}

/// Read one length field; the -1 sentinel becomes `None`
pub fn read_length<B: Buf>(buf: &mut B) -> Result<Option<u32>> {
    if buf.remaining() < 4 {
        return Err(SchemaError::MalformedSchema(format!(
            "Need 4 bytes for a length field, {} left",
            buf.remaining()
        )));
    }

    match buf.get_i32() {
        EMPTY_LENGTH => Ok(None),
        n if n < 0 => Err(SchemaError::MalformedSchema(format!(
            "Invalid negative length field: {}",
            n
        ))),
        n => Ok(Some(n as u32)),
    }
}

fn length_of(definition: &[u8]) -> Result<Option<u32>> {
    if definition.is_empty() {
        return Ok(None);
    }
    u32::try_from(definition.len()).map(Some).map_err(|_| {
        SchemaError::MalformedSchema(format!(
            "Schema definition of {} bytes is too large",
            definition.len()
        ))
    })
}

/// Encode two raw definitions into a composite definition
pub fn encode_definitions(key: &[u8], value: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + key.len() + value.len());

    write_length(&mut buf, length_of(key)?)?;
    buf.put_slice(key);

    write_length(&mut buf, length_of(value)?)?;
    buf.put_slice(value);

    Ok(buf.freeze())
}

/// Encode the definitions of a key schema and a value schema
pub fn encode(key: &SchemaInfo, value: &SchemaInfo) -> Result<Bytes> {
    encode_definitions(key.definition(), value.definition())
}

fn take_definition(buf: &mut Bytes, length: Option<u32>, half: &str) -> Result<Bytes> {
    let Some(len) = length else {
        return Ok(Bytes::new());
    };

    let len = len as usize;
    if len > buf.remaining() {
        return Err(SchemaError::MalformedSchema(format!(
            "{} schema length {} exceeds the {} remaining bytes",
            half,
            len,
            buf.remaining()
        )));
    }
    Ok(buf.split_to(len))
}

/// Decode a composite definition into its key and value definitions
///
/// Never reads past `data`; any inconsistency is a `MalformedSchema` error.
pub fn decode(data: &Bytes) -> Result<KeyValueParts> {
    let mut cursor = data.clone();

    let key_length = read_length(&mut cursor)?;
    let key = take_definition(&mut cursor, key_length, "Key")?;

    let value_length = read_length(&mut cursor)?;
    let value = take_definition(&mut cursor, value_length, "Value")?;

    if cursor.has_remaining() {
        return Err(SchemaError::MalformedSchema(format!(
            "{} trailing bytes after key/value schema",
            cursor.remaining()
        )));
    }

    Ok(KeyValueParts {
        key,
        value,
        key_length,
        value_length,
    })
}

impl SchemaInfo {
    /// Build a `KEY_VALUE` schema from a key schema and a value schema
    ///
    /// The definition holds both constituent definitions; names, types and
    /// properties of the halves are kept in the composite's properties.
    pub fn key_value(
        key: &SchemaInfo,
        value: &SchemaInfo,
        encoding: KeyValueEncodingType,
    ) -> Result<SchemaInfo> {
        let definition = encode(key, value)?;

        let mut properties = BTreeMap::new();
        properties.insert(PROP_KEY_NAME.to_string(), key.name().to_string());
        properties.insert(PROP_KEY_TYPE.to_string(), key.schema_type().as_str().to_string());
        properties.insert(
            PROP_KEY_PROPERTIES.to_string(),
            serde_json::to_string(key.properties())?,
        );
        properties.insert(PROP_VALUE_NAME.to_string(), value.name().to_string());
        properties.insert(
            PROP_VALUE_TYPE.to_string(),
            value.schema_type().as_str().to_string(),
        );
        properties.insert(
            PROP_VALUE_PROPERTIES.to_string(),
            serde_json::to_string(value.properties())?,
        );
        properties.insert(PROP_ENCODING_TYPE.to_string(), encoding.as_str().to_string());

        Ok(SchemaInfo::with_properties(
            SchemaType::KeyValue,
            KEY_VALUE_SCHEMA_NAME,
            definition,
            properties,
        ))
    }

    /// Encoding type of a `KEY_VALUE` schema (INLINE when not recorded)
    pub fn key_value_encoding(&self) -> Result<KeyValueEncodingType> {
        self.property(PROP_ENCODING_TYPE)
            .map(str::parse::<KeyValueEncodingType>)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Split a `KEY_VALUE` schema back into its key and value schemas
    pub fn split_key_value(&self) -> Result<(SchemaInfo, SchemaInfo)> {
        if !self.is_key_value() {
            return Err(SchemaError::InvalidSchema(format!(
                "Schema '{}' is {}, not KEY_VALUE",
                self.name(),
                self.schema_type()
            )));
        }

        let (key_def, value_def) = decode(self.definition())?.into_parts();
        let key = self.constituent(PROP_KEY_NAME, PROP_KEY_TYPE, PROP_KEY_PROPERTIES, key_def)?;
        let value = self.constituent(
            PROP_VALUE_NAME,
            PROP_VALUE_TYPE,
            PROP_VALUE_PROPERTIES,
            value_def,
        )?;
        Ok((key, value))
    }

    fn constituent(
        &self,
        name_prop: &str,
        type_prop: &str,
        properties_prop: &str,
        definition: Bytes,
    ) -> Result<SchemaInfo> {
        let schema_type = self
            .property(type_prop)
            .map(str::parse::<SchemaType>)
            .transpose()?
            .unwrap_or(SchemaType::Bytes);
        let name = self.property(name_prop).unwrap_or_default();
        let properties: BTreeMap<String, String> = match self.property(properties_prop) {
            Some(json) => serde_json::from_str(json)?,
            None => BTreeMap::new(),
        };
        Ok(SchemaInfo::with_properties(schema_type, name, definition, properties))
    }
}
