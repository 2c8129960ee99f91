//! Transparent sequential reads.
//!
//! [`open_transparent`] opens a file through the [`FileSystem`] and, when the file name
//! carries a compression suffix, wraps the stream in the matching decoder. Consuming the
//! returned stream to the end yields exactly the bytes the writer fed to the encoder.

use crate::io::compression::CodecRegistry;
use crate::io::fs::traits::{DatasetError, DatasetResult, FileSystem};
use log::debug;
use std::io::Read;

/// Open `path` and undo its stream compression, if any.
///
/// # Errors
///
/// Returns `UnsupportedCodec` if the name implies a codec the registry cannot decode, and
/// surfaces the backend's open failure (with the path attached) otherwise.
pub fn open_transparent(
    fs: &dyn FileSystem,
    registry: &CodecRegistry,
    path: &str,
) -> DatasetResult<Box<dyn Read + Send>> {
    // Unsupported codecs fail before the file is opened.
    registry.resolve_for_read(path)?;
    debug!("open {path}");
    let raw = fs.open(path).map_err(|e| attach(e, path))?;
    registry.wrap_reader(raw, path)
}

/// Read a whole file through [`open_transparent`].
///
/// # Errors
///
/// Same as [`open_transparent`], plus any error raised while decoding the stream.
pub fn read_all(fs: &dyn FileSystem, registry: &CodecRegistry, path: &str) -> DatasetResult<Vec<u8>> {
    let mut out = Vec::new();
    open_transparent(fs, registry, path)?
        .read_to_end(&mut out)
        .map_err(|e| DatasetError::from(e).with_source(path))?;
    Ok(out)
}

fn attach(err: DatasetError, path: &str) -> DatasetError {
    if err.source.is_some() {
        err
    } else {
        err.with_source(path)
    }
}
