//! Dataset I/O over a pluggable filesystem.
//!
//! Read path: [`enumerate`] resolves a location to member files, then each member is
//! opened through [`reader`] (sequential, decompressed by [`compression`]) or
//! [`seekable`] (random access, raw bytes). Container parsing and schema resolution live
//! in [`avro`].
//!
//! Write path: [`avro::AvroWrite`] shards records across files created through the
//! [`fs::FileSystem`] capability.

pub mod compression;
pub mod enumerate;
pub mod fs;
pub mod reader;
pub mod seekable;

#[cfg_attr(docsrs, doc(cfg(feature = "io-avro")))]
#[cfg(feature = "io-avro")]
pub mod avro;
