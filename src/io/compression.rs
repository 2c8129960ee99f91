//! Pluggable stream compression, resolved from file names.
//!
//! Dataset members may be stored whole-file compressed (`part-00000.avro.gz`). The
//! [`CodecRegistry`] maps a path suffix to a [`CompressionCodec`] that can wrap the raw
//! stream, so readers see the decompressed bytes without knowing how the file was written.
//!
//! ## Built-in Codecs
//!
//! When enabled via feature flags, the following codecs are available:
//! - **Gzip** (`.gz`, `.gzip`) - via `flate2` crate (feature: `compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) - via `zstd` crate (feature: `compression-zstd`)
//! - **Bzip2** (`.bz2`, `.bzip2`) - via `bzip2` crate (feature: `compression-bzip2`)
//! - **Xz** (`.xz`) - via `xz2` crate (feature: `compression-xz`)
//!
//! The registry also recognises suffixes it cannot decode (`.snappy`, `.lz4`, `.lzo`,
//! `.br`, and any built-in whose feature is disabled). Those resolve to
//! [`ErrorKind::UnsupportedCodec`] instead of being read as raw bytes.
//!
//! ## Custom Codec Implementation
//! ```
//! use ironshard::io::compression::{CodecRegistry, CompressionCodec};
//! use std::io::{Read, Write, Result};
//! use std::sync::Arc;
//!
//! struct MyCodec;
//!
//! impl CompressionCodec for MyCodec {
//!     fn name(&self) -> &str { "mycodec" }
//!
//!     fn extensions(&self) -> &[&str] { &[".myext"] }
//!
//!     fn wrap_reader_dyn(&self, reader: Box<dyn Read + Send>) -> Result<Box<dyn Read + Send>> {
//!         Ok(reader)
//!     }
//!
//!     fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> Result<Box<dyn Write>> {
//!         Ok(writer)
//!     }
//! }
//!
//! let registry = CodecRegistry::default().with_codec(Arc::new(MyCodec));
//! assert!(registry.resolve_for_read("data.avro.myext").unwrap().is_some());
//! ```
//!
//! ## Design Decisions
//!
//! The registry is a plain value passed to readers, not process-wide state. Two
//! pipelines in one process can use different registries.
//!
//! Compressed streams don't support random access. Seekable reads bypass this module
//! entirely; the container format compresses its own blocks.

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use log::debug;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// Pluggable compression codec trait.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; registries are shared between parallel readers.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// File extensions associated with this codec (e.g., `&[".gz", ".gzip"]`).
    ///
    /// Extensions should include the leading dot and be lowercase.
    fn extensions(&self) -> &[&str];

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read + Send>)
    -> std::io::Result<Box<dyn Read + Send>>;

    /// Wrap a writer with compression.
    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>>;
}

/// Suffixes the registry recognises regardless of which codecs are compiled in.
const KNOWN_SIGNATURES: &[(&str, &str)] = &[
    (".gz", "gzip"),
    (".gzip", "gzip"),
    (".zst", "zstd"),
    (".zstd", "zstd"),
    (".bz2", "bzip2"),
    (".bzip2", "bzip2"),
    (".xz", "xz"),
    (".snappy", "snappy"),
    (".sz", "snappy"),
    (".lz4", "lz4"),
    (".lzo", "lzo"),
    (".br", "brotli"),
];

/// Maps file names to stream codecs.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn CompressionCodec>>,
}

impl Default for CodecRegistry {
    /// Registry holding every built-in codec enabled by feature flags.
    fn default() -> Self {
        Self {
            codecs: vec![
                #[cfg(feature = "compression-gzip")]
                Arc::new(GzipCodec),
                #[cfg(feature = "compression-zstd")]
                Arc::new(ZstdCodec),
                #[cfg(feature = "compression-bzip2")]
                Arc::new(Bzip2Codec),
                #[cfg(feature = "compression-xz")]
                Arc::new(XzCodec),
            ],
        }
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl CodecRegistry {
    /// Registry with no decoders; every recognised suffix is unsupported.
    #[must_use]
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Return a registry that also knows `codec`. Custom codecs win over built-ins that
    /// claim the same extension.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn CompressionCodec>) -> Self {
        self.codecs.insert(0, codec);
        self
    }

    /// Names of the codecs this registry can instantiate.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.codecs.iter().map(|c| c.name()).collect()
    }

    /// Decoder for a name like `gzip`, if one is registered.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn CompressionCodec>> {
        self.codecs.iter().find(|c| c.name() == name).cloned()
    }

    /// Name of the codec implied by a path, whether or not it can be decoded.
    #[must_use]
    pub fn codec_hint(&self, path: &str) -> Option<String> {
        if let Some(codec) = self.match_codec(path) {
            return Some(codec.name().to_string());
        }
        match_signature(path).map(str::to_string)
    }

    /// Resolve the stream codec for a path.
    ///
    /// Returns `Ok(None)` when the name carries no compression suffix.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCodec` when the suffix is recognised but no decoder is
    /// registered for it.
    pub fn resolve_for_read(&self, path: &str) -> DatasetResult<Option<Arc<dyn CompressionCodec>>> {
        if let Some(codec) = self.match_codec(path) {
            return Ok(Some(codec));
        }
        match match_signature(path) {
            Some(name) => Err(DatasetError::new(
                ErrorKind::UnsupportedCodec,
                format!("No decoder available for {name} compression"),
            )
            .with_source(path)),
            None => Ok(None),
        }
    }

    /// Wrap `reader` with whatever decompression the path calls for.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCodec` as [`resolve_for_read`](Self::resolve_for_read) does, or an
    /// I/O error if the decoder cannot be constructed.
    pub fn wrap_reader(
        &self,
        reader: Box<dyn Read + Send>,
        path: &str,
    ) -> DatasetResult<Box<dyn Read + Send>> {
        match self.resolve_for_read(path)? {
            Some(codec) => {
                debug!("decompressing {path} with {}", codec.name());
                codec
                    .wrap_reader_dyn(reader)
                    .map_err(|e| DatasetError::from(e).with_source(path))
            }
            None => Ok(reader),
        }
    }

    /// Wrap `writer` with whatever compression the path calls for.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCodec` for recognised suffixes without an encoder.
    pub fn wrap_writer(&self, writer: Box<dyn Write>, path: &str) -> DatasetResult<Box<dyn Write>> {
        match self.resolve_for_read(path)? {
            Some(codec) => codec
                .wrap_writer_dyn(writer)
                .map_err(|e| DatasetError::from(e).with_source(path)),
            None => Ok(writer),
        }
    }

    fn match_codec(&self, path: &str) -> Option<Arc<dyn CompressionCodec>> {
        let lower = path.to_lowercase();
        self.codecs
            .iter()
            .find(|codec| codec.extensions().iter().any(|ext| lower.ends_with(ext)))
            .cloned()
    }
}

fn match_signature(path: &str) -> Option<&'static str> {
    let lower = path.to_lowercase();
    KNOWN_SIGNATURES
        .iter()
        .find(|(ext, _)| lower.ends_with(ext))
        .map(|(_, name)| *name)
}

// ============================================================================
// Built-in Codec Implementations
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn wrap_reader_dyn(
        &self,
        reader: Box<dyn Read + Send>,
    ) -> std::io::Result<Box<dyn Read + Send>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn wrap_reader_dyn(
        &self,
        reader: Box<dyn Read + Send>,
    ) -> std::io::Result<Box<dyn Read + Send>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read + Send>)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        zstd::stream::write::Encoder::new(writer, 3)
            .map(|e| Box::new(e.auto_finish()) as Box<dyn Write>)
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extensions(&self) -> &[&str] {
        &[".bz2", ".bzip2"]
    }

    fn wrap_reader_dyn(
        &self,
        reader: Box<dyn Read + Send>,
    ) -> std::io::Result<Box<dyn Read + Send>> {
        use bzip2::read::BzDecoder;
        Ok(Box::new(BzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;
        Ok(Box::new(BzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn extensions(&self) -> &[&str] {
        &[".xz"]
    }

    fn wrap_reader_dyn(
        &self,
        reader: Box<dyn Read + Send>,
    ) -> std::io::Result<Box<dyn Read + Send>> {
        use xz2::read::XzDecoder;
        Ok(Box::new(XzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        use xz2::write::XzEncoder;
        Ok(Box::new(XzEncoder::new(writer, 6)))
    }
}
