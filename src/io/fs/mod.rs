//! Filesystem capability used by every reader and writer.
//!
//! The dataset layer never talks to a storage client directly. It consumes the narrow
//! [`FileSystem`] trait, so alternate backends can be swapped in without touching the
//! read/write logic:
//!
//! - [`LocalFileSystem`] - local disk, configured by an explicit [`FsConfig`]
//! - [`InMemoryFileSystem`] - shared in-memory map, used by the test suite and handy for
//!   unit-testing pipelines without touching disk
//!
//! ## Usage
//! ```
//! use ironshard::io::fs::*;
//! use std::io::Read;
//!
//! # fn main() -> DatasetResult<()> {
//! let fs = InMemoryFileSystem::new();
//! fs.put("mem://bucket/data/part-0.avro", b"bytes".to_vec());
//!
//! let entries = fs.list("mem://bucket/data")?;
//! assert_eq!(entries.len(), 1);
//!
//! let mut contents = Vec::new();
//! fs.open("mem://bucket/data/part-0.avro")?.read_to_end(&mut contents)?;
//! assert_eq!(contents, b"bytes");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`DatasetResult`]. Backends report missing paths as
//! [`ErrorKind::PathNotFound`] and pass other failures through as [`ErrorKind::Io`]; the
//! layers above never retry.

pub mod helpers;
pub mod local;
pub mod memory;
pub mod traits;

pub use local::{FsConfig, LocalFileSystem};
pub use memory::InMemoryFileSystem;
pub use traits::*;
