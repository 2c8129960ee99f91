//! Core traits and types for filesystem access.
//!
//! The [`FileSystem`] trait is the only thing the dataset layer knows about storage.
//! It is deliberately narrow: list a directory, open a stream, ask for a length, open a
//! seekable handle, and create a file for writing.

use std::error::Error;
use std::fmt;
use std::io::{Read, Write};

// ============================================================================
// Core Error Type
// ============================================================================

/// Error type shared by every dataset operation.
#[derive(Debug, Clone)]
pub struct DatasetError {
    pub message: String,
    pub kind: ErrorKind,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A path, directory, or glob matched nothing.
    PathNotFound,
    /// A codec was named (by a path suffix or a container header) that cannot be used.
    UnsupportedCodec,
    /// The reader schema adds a field without a default.
    IncompatibleSchema,
    /// A shard file could not be created or written.
    DestinationUnwritable,
    /// The container header is missing, truncated, or inconsistent.
    MalformedContainerHeader,
    InvalidInput,
    /// Record encoding or decoding failed.
    Encoding,
    Io,
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl Error for DatasetError {}

impl DatasetError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            source: None,
        }
    }

    /// Attach the file or shard the error is about.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Shorthand for `PathNotFound` errors.
    pub fn not_found(path: &str) -> Self {
        Self::new(ErrorKind::PathNotFound, format!("{path} not found"))
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::PathNotFound,
            _ => ErrorKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}

#[cfg(feature = "io-avro")]
impl From<apache_avro::Error> for DatasetError {
    fn from(err: apache_avro::Error) -> Self {
        Self::new(ErrorKind::Encoding, err.to_string())
    }
}

pub type DatasetResult<T> = Result<T, DatasetError>;

// ============================================================================
// Entries
// ============================================================================

/// One entry returned by [`FileSystem::list`] or the directory enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path, in the same addressing scheme as the listed directory.
    pub path: String,
    /// Content length in bytes (0 for directories).
    pub len: u64,
    pub is_dir: bool,
    /// Name of the stream codec implied by the file name, if any.
    pub codec_hint: Option<String>,
}

impl FileEntry {
    pub fn file(path: impl Into<String>, len: u64) -> Self {
        Self {
            path: path.into(),
            len,
            is_dir: false,
            codec_hint: None,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: true,
            codec_hint: None,
        }
    }

    /// The final path component.
    #[must_use]
    pub fn name(&self) -> &str {
        crate::io::fs::helpers::base_name(&self.path)
    }
}

// ============================================================================
// Capability traits
// ============================================================================

/// Random-access handle returned by [`FileSystem::open_seekable`].
pub trait SeekableHandle: Send {
    /// Current position in bytes from the start of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be queried.
    fn tell(&mut self) -> DatasetResult<u64>;

    /// Move to an absolute position. Positions past the end are allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the seek.
    fn seek(&mut self, pos: u64) -> DatasetResult<()>;

    /// Read up to `buf.len()` bytes, returning 0 at end of file.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn read(&mut self, buf: &mut [u8]) -> DatasetResult<usize>;

    /// Release the handle. Calling it twice must be harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release the handle.
    fn close(&mut self) -> DatasetResult<()>;
}

/// Minimal filesystem capability.
///
/// Paths are URI-like strings (`file:///data/x.avro`, `mem://bucket/x.avro`). Each backend
/// decides which schemes it accepts. Every call is a fresh round trip; nothing is cached.
pub trait FileSystem: Send + Sync {
    /// List the immediate children of a directory.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the directory does not exist, or an I/O error if the listing fails
    fn list(&self, dir: &str) -> DatasetResult<Vec<FileEntry>>;

    /// Open a file as a sequential byte stream.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the file does not exist, or an I/O error if it cannot be opened
    fn open(&self, path: &str) -> DatasetResult<Box<dyn Read + Send>>;

    /// Authoritative content length of a file.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the file does not exist
    fn content_length(&self, path: &str) -> DatasetResult<u64>;

    /// Open a file for random access.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the file does not exist, or an I/O error if it cannot be opened
    fn open_seekable(&self, path: &str) -> DatasetResult<Box<dyn SeekableHandle>>;

    /// Create (or truncate) a file for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written
    fn create(&self, path: &str) -> DatasetResult<Box<dyn Write + Send>>;
}
