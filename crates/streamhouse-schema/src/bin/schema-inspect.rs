//! StreamHouse Schema Inspector
//!
//! Offline tool for building and inspecting composite key/value schemas.
//!
//! # Usage
//!
//! ```bash
//! # Combine an AVRO key and a JSON value into one composite definition
//! schema-inspect encode-kv --key-file key.avsc --key-type avro \
//!     --value-file value.json --value-type json --output kv.bin
//!
//! # Show the length fields and both halves of a composite definition
//! schema-inspect decode-kv kv.bin
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: warn)
//! - `SCHEMA_INSPECT_KV_ENCODING`: Default `--encoding` for `encode-kv`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamhouse_schema::{keyvalue, KeyValueEncodingType, SchemaInfo, SchemaType};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-inspect")]
#[command(about = "Build and inspect StreamHouse key/value schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode two schema definitions into a composite key/value definition
    EncodeKv {
        /// Key schema definition file (omit for an empty key)
        #[arg(long)]
        key_file: Option<PathBuf>,
        /// Key schema type
        #[arg(long, default_value = "bytes")]
        key_type: SchemaType,
        /// Value schema definition file (omit for an empty value)
        #[arg(long)]
        value_file: Option<PathBuf>,
        /// Value schema type
        #[arg(long, default_value = "bytes")]
        value_type: SchemaType,
        /// Key/value encoding layout
        #[arg(long, env = "SCHEMA_INSPECT_KV_ENCODING", default_value = "inline")]
        encoding: KeyValueEncodingType,
        /// Write the composite bytes here instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a composite key/value definition and print a JSON summary
    DecodeKv {
        /// Composite definition file
        input: PathBuf,
    },
}

fn read_definition(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read schema definition {}", path.display())),
        None => Ok(Vec::new()),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::EncodeKv {
            key_file,
            key_type,
            value_file,
            value_type,
            encoding,
            output,
        } => {
            let key = SchemaInfo::new(key_type, "key", read_definition(key_file.as_ref())?);
            let value = SchemaInfo::new(value_type, "value", read_definition(value_file.as_ref())?);

            let composite = SchemaInfo::key_value(&key, &value, encoding)
                .context("Failed to encode key/value schema")?;
            debug!(
                key_type = %key_type,
                value_type = %value_type,
                size = composite.definition().len(),
                "Encoded key/value schema"
            );

            match output {
                Some(path) => {
                    std::fs::write(&path, composite.definition())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Composite definition written");
                }
                None => println!("{}", to_hex(composite.definition())),
            }
        }
        Commands::DecodeKv { input } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let parts = keyvalue::decode(&data.into())
                .with_context(|| format!("{} is not a key/value schema", input.display()))?;

            let (key_length, value_length) = parts.lengths();
            let summary = serde_json::json!({
                "key_length": key_length.map(i64::from).unwrap_or(-1),
                "value_length": value_length.map(i64::from).unwrap_or(-1),
                "key": String::from_utf8_lossy(parts.key()),
                "value": String::from_utf8_lossy(parts.value()),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
