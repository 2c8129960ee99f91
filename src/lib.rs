//! # Ironshard
//!
//! **Sharded, codec-aware dataset I/O** for self-describing container files (Avro object
//! container files) stored on a pluggable filesystem. A directory of container files is
//! treated as one logical dataset that a pipeline can read and write without caring how
//! many files back it.
//!
//! ## Key Features
//!
//! - **Pluggable storage** - everything goes through the narrow [`FileSystem`] trait;
//!   local-disk and in-memory backends ship with the crate
//! - **Dataset enumeration** - directories, single files, and globs, with `_`/`.`
//!   housekeeping files filtered out
//! - **Transparent decompression** - gzip, zstd, bzip2, and xz streams are decoded based
//!   on the file name (all optional via feature flags)
//! - **Random access** - [`SeekableInput`] exposes `tell`/`seek`/`read`/`length` so the
//!   container can be split into independently readable block ranges
//! - **Sharded writes** - fixed or automatic shard counts, templated names, block codecs,
//!   and user metadata in every shard header
//! - **Schema evolution** - old files read under a newer schema, with defaults filling
//!   the fields the old writer never knew about
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironshard::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Event {
//!     id: i64,
//!     kind: String,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = r#"{"type": "record", "name": "Event", "fields": [
//!     {"name": "id", "type": "long"},
//!     {"name": "kind", "type": "string"}
//! ]}"#;
//!
//! let fs = LocalFileSystem::new(FsConfig::default().with_root("/data"));
//! let events = vec![Event { id: 1, kind: "click".into() }];
//!
//! let summary = AvroWrite::to("events/part")
//!     .with_schema_str(schema)?
//!     .with_num_shards(8)
//!     .with_suffix(".avro")
//!     .with_codec(AvroCodec::deflate(6))
//!     .with_metadata("pipeline", "ingest")
//!     .write_all(&fs, &events)?;
//! println!("wrote {} shard files", summary.paths.len());
//!
//! let back: Vec<Event> = AvroRead::from("events").read(&fs)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `io-avro` - container reads and writes (the [`io::avro`] module)
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`, `compression-xz` -
//!   stream codecs for the transparent reader
//! - `parallel-io` - `write_all_par` and `read_par`, backed by Rayon
//!
//! ## Module Overview
//!
//! - [`io::fs`] - the filesystem capability and its backends
//! - [`io::compression`] - stream codec registry
//! - [`io::enumerate`] - dataset enumeration
//! - [`io::reader`] / [`io::seekable`] - sequential and random-access inputs
//! - [`io::avro`] - container headers, sharded writes, schema-resolving reads
//! - [`testing`] - fixtures and assertions for tests of code built on this crate

pub mod io;
pub mod testing;

pub use io::compression::{CodecRegistry, CompressionCodec};
pub use io::enumerate::{enumerate, sorted_paths};
pub use io::fs::{
    DatasetError, DatasetResult, ErrorKind, FileEntry, FileSystem, FsConfig,
    InMemoryFileSystem, LocalFileSystem,
};
pub use io::reader::open_transparent;
pub use io::seekable::SeekableInput;

#[cfg(feature = "io-avro")]
pub use io::avro::{
    AccessMode, AvroCodec, AvroRead, AvroWrite, BlockRange, ContainerHeader, SchemaPair,
    ShardedWriter, WriteSummary, read_avro_vec, write_avro_vec,
};
