//! Message Envelope
//!
//! Attaches the schema version tag to messages and frames messages for the
//! transport.
//!
//! Frame format:
//!
//! ```text
//! ┌───────┬──────────────────┬────────────┬───────┬─────────┐
//! │ flags │ version (8)      │ key_len(4) │ key   │ payload │
//! │ (1)   │ iff flags bit 0  │ -1 = none  │       │ (rest)  │
//! └───────┴──────────────────┴────────────┴───────┴─────────┘
//! ```
//!
//! `key_len` is a big-endian signed 32-bit integer. The payload runs to the end
//! of the frame.

use crate::error::{ClientError, Result};
use crate::message::Message;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use streamhouse_schema::SchemaVersion;

const FLAG_SCHEMA_VERSION: u8 = 0b0000_0001;
const NO_KEY: i32 = -1;

/// Tag a message with the schema version it was written with
pub fn attach_version(message: &mut Message, version: SchemaVersion) {
    message.set_schema_version(Some(version));
}

/// The schema version a message was tagged with, if any
pub fn read_version(message: &Message) -> Option<SchemaVersion> {
    message.schema_version()
}

/// Serialize a message into a transport frame
pub fn encode(message: &Message) -> Result<Bytes> {
    let key_len = message.key().map(|k| k.len()).unwrap_or(0);
    let mut buf = BytesMut::with_capacity(1 + SchemaVersion::LEN + 4 + key_len + message.payload().len());

    match message.schema_version() {
        Some(version) => {
            buf.put_u8(FLAG_SCHEMA_VERSION);
            buf.put_slice(version.as_bytes());
        }
        None => buf.put_u8(0),
    }

    match message.key() {
        Some(key) => {
            let len = i32::try_from(key.len()).map_err(|_| {
                ClientError::MalformedMessage(format!("Key of {} bytes is too large", key.len()))
            })?;
            buf.put_i32(len);
            buf.put_slice(key);
        }
        None => buf.put_i32(NO_KEY),
    }

    buf.put_slice(message.payload());
    Ok(buf.freeze())
}

/// Parse a transport frame back into a message
pub fn decode(frame: &[u8]) -> Result<Message> {
    let mut buf = Bytes::copy_from_slice(frame);

    if !buf.has_remaining() {
        return Err(ClientError::MalformedMessage("Empty frame".to_string()));
    }
    let flags = buf.get_u8();
    if flags & !FLAG_SCHEMA_VERSION != 0 {
        return Err(ClientError::MalformedMessage(format!(
            "Unknown frame flags: {:#04x}",
            flags
        )));
    }

    let version = if flags & FLAG_SCHEMA_VERSION != 0 {
        if buf.remaining() < SchemaVersion::LEN {
            return Err(ClientError::MalformedMessage(format!(
                "Frame truncated in schema version ({} bytes left)",
                buf.remaining()
            )));
        }
        SchemaVersion::from_slice(&buf.split_to(SchemaVersion::LEN))
    } else {
        None
    };

    if buf.remaining() < 4 {
        return Err(ClientError::MalformedMessage(
            "Frame truncated in key length".to_string(),
        ));
    }
    let key = match buf.get_i32() {
        NO_KEY => None,
        len if len < 0 => {
            return Err(ClientError::MalformedMessage(format!(
                "Negative key length: {}",
                len
            )))
        }
        len => {
            let len = len as usize;
            if len > buf.remaining() {
                return Err(ClientError::MalformedMessage(format!(
                    "Key length {} exceeds the {} remaining bytes",
                    len,
                    buf.remaining()
                )));
            }
            Some(buf.split_to(len))
        }
    };

    let mut builder = Message::builder().payload(buf);
    if let Some(key) = key {
        builder = builder.key(key);
    }
    let mut message = builder.build();
    message.set_schema_version(version);
    Ok(message)
}
