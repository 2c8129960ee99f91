//! Dataset reads with schema resolution.
//!
//! [`AvroRead`] resolves a dataset location to its member files, validates each file's
//! header, and projects every record onto the reader schema (see
//! [`SchemaPair`]). Files are read in sorted path order, so the output order is
//! deterministic for a fixed set of files.
//!
//! Two access paths are available:
//! - [`AccessMode::Sequential`] streams each file through the transparent reader, undoing
//!   any file-level compression implied by its name
//! - [`AccessMode::Seekable`] reads through the seekable handle; files must not be
//!   stream-compressed
//!
//! [`AvroRead::split`] and [`AvroRead::read_range`] divide a dataset into independently
//! readable block ranges, the way a runner hands out work to parallel readers.

use crate::io::avro::blocks::{BlockRange, group_blocks, scan_blocks};
use crate::io::avro::header::ContainerHeader;
use crate::io::avro::schema::SchemaPair;
use crate::io::compression::CodecRegistry;
use crate::io::enumerate::{sorted_paths, sorted_paths_required};
use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind, FileSystem};
use crate::io::reader::open_transparent;
use crate::io::seekable::SeekableInput;
use apache_avro::types::Value;
use apache_avro::{Reader, Schema};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor, Read};

pub const DEFAULT_READ_NAME: &str = "AvroIO.Read";

/// How member files are opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessMode {
    #[default]
    Sequential,
    Seekable,
}

/// Configuration of a dataset read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvroRead {
    name: String,
    location: String,
    #[serde(with = "crate::io::avro::schema::serde_schema")]
    schema: Option<Schema>,
    validate: bool,
    access: AccessMode,
    #[serde(skip)]
    registry: CodecRegistry,
}

impl AvroRead {
    /// Start a read of `location`: a directory, a file, or a glob over file names.
    pub fn from(location: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_READ_NAME.to_string(),
            location: location.into(),
            schema: None,
            validate: true,
            access: AccessMode::Sequential,
            registry: CodecRegistry::default(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reader schema. Without one, each file is read under its own writer schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` if the JSON is not a valid schema.
    pub fn with_schema_str(self, json: &str) -> DatasetResult<Self> {
        let schema = Schema::parse_str(json).map_err(|e| {
            DatasetError::new(ErrorKind::InvalidInput, format!("invalid schema: {e}"))
        })?;
        Ok(self.with_schema(schema))
    }

    /// Let a location that matches nothing produce an empty result.
    #[must_use]
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    #[must_use]
    pub fn needs_validation(&self) -> bool {
        self.validate
    }

    #[must_use]
    pub fn access(&self) -> AccessMode {
        self.access
    }

    #[must_use]
    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Member files of the location, sorted.
    ///
    /// # Errors
    ///
    /// With validation, returns `PathNotFound` when nothing matches. Listing failures other
    /// than a missing location are always surfaced.
    pub fn files(&self, fs: &dyn FileSystem) -> DatasetResult<Vec<String>> {
        if self.validate {
            return sorted_paths_required(fs, &self.registry, &self.location);
        }
        match sorted_paths(fs, &self.registry, &self.location) {
            Err(e) if e.kind == ErrorKind::PathNotFound => {
                debug!("{}: {} matched nothing", self.name, self.location);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Parse the header of one file through the transparent reader.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContainerHeader` or `UnsupportedCodec` for bad headers, and the
    /// usual open errors.
    pub fn read_header(&self, fs: &dyn FileSystem, path: &str) -> DatasetResult<ContainerHeader> {
        let stream = open_transparent(fs, &self.registry, path)?;
        ContainerHeader::read_from(stream).map_err(|e| e.with_source(path))
    }

    /// Read every record as a generic value, projected onto the reader schema.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be opened, has a bad header, is incompatible
    /// with the reader schema, or contains an undecodable block.
    pub fn read_values(&self, fs: &dyn FileSystem) -> DatasetResult<Vec<Value>> {
        let files = self.files(fs)?;
        let mut out = Vec::new();
        for path in &files {
            self.read_file(fs, path, &mut out)?;
        }
        info!("{}: read {} records from {} file(s)", self.name, out.len(), files.len());
        Ok(out)
    }

    /// Read every record into `T`.
    ///
    /// # Errors
    ///
    /// As for [`read_values`](Self::read_values), plus `Encoding` when a record does not
    /// deserialize into `T`.
    pub fn read<T: DeserializeOwned>(&self, fs: &dyn FileSystem) -> DatasetResult<Vec<T>> {
        self.read_values(fs)?.iter().map(from_value).collect()
    }

    /// Read files concurrently; the output keeps sorted file order.
    ///
    /// # Errors
    ///
    /// As for [`read`](Self::read).
    #[cfg(feature = "parallel-io")]
    pub fn read_par<T: DeserializeOwned + Send>(&self, fs: &dyn FileSystem) -> DatasetResult<Vec<T>> {
        use rayon::prelude::*;

        let files = self.files(fs)?;
        let per_file = files
            .par_iter()
            .map(|path| {
                let mut values = Vec::new();
                self.read_file(fs, path, &mut values)?;
                values.iter().map(from_value).collect::<DatasetResult<Vec<T>>>()
            })
            .collect::<DatasetResult<Vec<_>>>()?;
        let out: Vec<T> = per_file.into_iter().flatten().collect();
        info!("{}: read {} records from {} file(s)", self.name, out.len(), files.len());
        Ok(out)
    }

    /// Divide the dataset into block ranges of roughly `desired_bundle_bytes` each.
    ///
    /// Every block of every file lands in exactly one range. Empty files produce no ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for stream-compressed files, which have no addressable
    /// blocks, and `MalformedContainerHeader` for corrupt block framing.
    pub fn split(
        &self,
        fs: &dyn FileSystem,
        desired_bundle_bytes: u64,
    ) -> DatasetResult<Vec<BlockRange>> {
        let mut ranges = Vec::new();
        for path in self.files(fs)? {
            self.require_raw(&path)?;
            let mut input = SeekableInput::open(fs, &path)?;
            let header = ContainerHeader::read_from(&mut input).map_err(|e| e.with_source(&path))?;
            let blocks = scan_blocks(&mut input, &header)?;
            debug!("{path}: {} block(s) after a {}-byte header", blocks.len(), header.len());
            ranges.extend(group_blocks(&path, &blocks, desired_bundle_bytes));
        }
        Ok(ranges)
    }

    /// Decode only the blocks of one range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the range does not lie within the file's block area, plus
    /// the errors of [`read_values`](Self::read_values).
    pub fn read_range_values(
        &self,
        fs: &dyn FileSystem,
        range: &BlockRange,
    ) -> DatasetResult<Vec<Value>> {
        self.require_raw(&range.path)?;
        let mut input = SeekableInput::open(fs, &range.path)?;
        let header =
            ContainerHeader::read_from(&mut input).map_err(|e| e.with_source(&range.path))?;
        if range.start < header.len() || range.end < range.start || range.end > input.length() {
            return Err(DatasetError::new(
                ErrorKind::InvalidInput,
                format!(
                    "range {}..{} is outside the block area {}..{}",
                    range.start,
                    range.end,
                    header.len(),
                    input.length()
                ),
            )
            .with_source(&range.path));
        }
        let pair = self.schema_pair(&header, &range.path)?;

        let mut bytes = read_span(&mut input, 0, header.len())?;
        bytes.extend(read_span(&mut input, range.start, range.end)?);
        input.close()?;

        let mut out = Vec::new();
        decode_into(Cursor::new(bytes), &pair, &range.path, &mut out)?;
        Ok(out)
    }

    /// Typed form of [`read_range_values`](Self::read_range_values).
    ///
    /// # Errors
    ///
    /// As for [`read_range_values`](Self::read_range_values).
    pub fn read_range<T: DeserializeOwned>(
        &self,
        fs: &dyn FileSystem,
        range: &BlockRange,
    ) -> DatasetResult<Vec<T>> {
        self.read_range_values(fs, range)?.iter().map(from_value).collect()
    }

    fn read_file(&self, fs: &dyn FileSystem, path: &str, out: &mut Vec<Value>) -> DatasetResult<()> {
        match self.access {
            AccessMode::Sequential => {
                let mut stream = open_transparent(fs, &self.registry, path)?;
                let mut recorder = Recorder {
                    inner: &mut stream,
                    seen: Vec::new(),
                };
                let header =
                    ContainerHeader::read_from(&mut recorder).map_err(|e| e.with_source(path))?;
                let pair = self.schema_pair(&header, path)?;
                let replay = Cursor::new(recorder.seen).chain(stream);
                decode_into(replay, &pair, path, out)
            }
            AccessMode::Seekable => {
                self.require_raw(path)?;
                let mut input = SeekableInput::open(fs, path)?;
                let header =
                    ContainerHeader::read_from(&mut input).map_err(|e| e.with_source(path))?;
                let pair = self.schema_pair(&header, path)?;
                input.seek(0)?;
                decode_into(input, &pair, path, out)
            }
        }
    }

    fn schema_pair(&self, header: &ContainerHeader, path: &str) -> DatasetResult<SchemaPair> {
        let writer = header.schema().clone();
        match &self.schema {
            Some(reader) => SchemaPair::new(writer, reader.clone()),
            None => SchemaPair::identity(writer),
        }
        .map_err(|e| e.with_source(path))
    }

    fn require_raw(&self, path: &str) -> DatasetResult<()> {
        match self.registry.codec_hint(path) {
            Some(codec) => Err(DatasetError::new(
                ErrorKind::InvalidInput,
                format!("{codec}-compressed files cannot be read by block offset"),
            )
            .with_source(path)),
            None => Ok(()),
        }
    }
}

fn decode_into<R: Read>(
    input: R,
    pair: &SchemaPair,
    path: &str,
    out: &mut Vec<Value>,
) -> DatasetResult<()> {
    let reader = Reader::new(input).map_err(|e| encoding(&e, path))?;
    for value in reader {
        let value = value.map_err(|e| encoding(&e, path))?;
        out.push(pair.project(value).map_err(|e| e.with_source(path))?);
    }
    Ok(())
}

fn read_span(input: &mut SeekableInput, start: u64, end: u64) -> DatasetResult<Vec<u8>> {
    let len = usize::try_from(end - start)
        .map_err(|_| DatasetError::new(ErrorKind::InvalidInput, "range too large to buffer"))?;
    let mut buf = vec![0u8; len];
    input.seek(start)?;
    input
        .read_exact(&mut buf)
        .map_err(|e| DatasetError::from(e).with_source(input.path()))?;
    Ok(buf)
}

fn from_value<T: DeserializeOwned>(value: &Value) -> DatasetResult<T> {
    Ok(apache_avro::from_value::<T>(value)?)
}

fn encoding(err: &apache_avro::Error, path: &str) -> DatasetError {
    DatasetError::new(ErrorKind::Encoding, err.to_string()).with_source(path)
}

/// Keeps a copy of everything read through it, so the header can be parsed once for
/// validation and then replayed to the record decoder.
struct Recorder<'r, R> {
    inner: &'r mut R,
    seen: Vec<u8>,
}

impl<R: Read> Read for Recorder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.seen.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
