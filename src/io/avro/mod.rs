//! Avro object container datasets.
//!
//! A dataset is one or more container files under a common location. This module
//! provides:
//! - **Sharded writes**: [`AvroWrite`] and [`ShardedWriter`]
//! - **Schema-resolving reads**: [`AvroRead`], sequential or seekable ([`AccessMode`])
//! - **Header inspection**: [`ContainerHeader`]
//! - **Block ranges** for parallel readers: [`AvroRead::split`] and [`AvroRead::read_range`]
//! - **Typed vector I/O**: [`read_avro_vec`] and [`write_avro_vec`]
//!
//! # Example
//! ```no_run
//! use ironshard::io::avro::{AvroRead, AvroWrite};
//! use ironshard::io::fs::InMemoryFileSystem;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct Click {
//!     user: String,
//!     count: i64,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = r#"{"type": "record", "name": "Click", "fields": [
//!     {"name": "user", "type": "string"},
//!     {"name": "count", "type": "long"}
//! ]}"#;
//!
//! let fs = InMemoryFileSystem::new();
//! let clicks = vec![Click { user: "ada".into(), count: 3 }];
//! AvroWrite::to("mem://bucket/clicks/part")
//!     .with_schema_str(schema)?
//!     .with_num_shards(2)
//!     .with_suffix(".avro")
//!     .write_all(&fs, &clicks)?;
//!
//! let back: Vec<Click> = AvroRead::from("mem://bucket/clicks").read(&fs)?;
//! assert_eq!(back, clicks);
//! # Ok(())
//! # }
//! ```

pub mod blocks;
pub mod codec;
pub mod header;
pub mod metadata;
pub mod read;
pub mod schema;
pub mod shard;
pub mod write;

pub use blocks::{BlockInfo, BlockRange};
pub use codec::AvroCodec;
pub use header::ContainerHeader;
pub use metadata::{Metadata, MetadataValue};
pub use read::{AccessMode, AvroRead};
pub use schema::SchemaPair;
pub use shard::{ShardCount, ShardNameTemplate, ShardSpec};
pub use write::{AvroWrite, ShardedWriter, WriteSummary};

use crate::io::fs::traits::FileSystem;
use anyhow::{Context, Result};
use apache_avro::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read every record under `location` into a typed `Vec<T>`, in sorted file order.
///
/// Each file is read under its own writer schema.
///
/// # Errors
/// Returns an error if the location matches nothing, or any file fails to open, parse, or
/// deserialize into `T`.
pub fn read_avro_vec<T: DeserializeOwned>(fs: &dyn FileSystem, location: &str) -> Result<Vec<T>> {
    AvroRead::from(location)
        .read(fs)
        .with_context(|| format!("read Avro dataset {location}"))
}

/// Write a typed slice as a sharded dataset with default naming and no block codec.
///
/// `shards == 0` picks the count from the encoded size.
///
/// # Errors
/// Returns an error if an item does not match `schema` or a shard cannot be written.
pub fn write_avro_vec<T: Serialize>(
    fs: &dyn FileSystem,
    prefix: &str,
    schema: &Schema,
    shards: usize,
    data: &[T],
) -> Result<WriteSummary> {
    AvroWrite::to(prefix)
        .with_schema(schema.clone())
        .with_num_shards(shards)
        .with_suffix(".avro")
        .write_all(fs, data)
        .with_context(|| format!("write Avro dataset {prefix}"))
}
