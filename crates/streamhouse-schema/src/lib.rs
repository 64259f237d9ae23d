//! StreamHouse Schema
//!
//! Schema model, key/value schema codec and topic compatibility policy shared
//! by StreamHouse producers, consumers and schema registries.
//!
//! # Features
//!
//! - **Schema Model**: `SchemaInfo` with type, name, definition bytes and properties
//! - **Key/Value Codec**: length-prefixed encoding of composite key/value schemas
//! - **Compatibility**: strict producer matching, lenient consumer matching
//! - **Registry Contract**: `SchemaRegistry` trait plus an in-memory implementation
//!
//! # Usage
//!
//! ```ignore
//! use streamhouse_schema::{MemorySchemaRegistry, SchemaCompatibilityResolver, SchemaInfo, SchemaRole, SchemaType};
//!
//! let registry = MemorySchemaRegistry::new();
//! let resolver = SchemaCompatibilityResolver::new(false);
//!
//! let schema = SchemaInfo::new(SchemaType::Json, "orders", "{}");
//! let outcome = resolver
//!     .resolve(&registry, "orders", SchemaRole::Producer, Some(&schema))
//!     .await?;
//!
//! assert!(outcome.version.is_some());
//! ```

pub mod compatibility;
pub mod error;
pub mod keyvalue;
pub mod registry;
pub mod types;

pub use compatibility::{BindOutcome, Resolution, SchemaCompatibilityResolver, TopicBinding};
pub use error::{Result, SchemaError};
pub use keyvalue::KeyValueParts;
pub use registry::{MemorySchemaRegistry, SchemaRegistry};
pub use types::*;
