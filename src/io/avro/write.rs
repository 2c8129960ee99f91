//! Sharded container-file writes.
//!
//! [`AvroWrite`] is an immutable configuration: every `with_*` call returns a new value,
//! so a base configuration can be cloned and specialised without affecting other
//! writers. [`AvroWrite::open`] turns it into a [`ShardedWriter`], which routes records
//! round-robin to its shards.
//!
//! # Example
//! ```no_run
//! use ironshard::io::avro::{AvroCodec, AvroWrite};
//! use ironshard::io::fs::InMemoryFileSystem;
//!
//! # fn main() -> ironshard::DatasetResult<()> {
//! let fs = InMemoryFileSystem::new();
//! let write = AvroWrite::to("mem://bucket/out/words")
//!     .with_schema_str(r#""string""#)?
//!     .with_num_shards(4)
//!     .with_suffix(".avro")
//!     .with_codec(AvroCodec::deflate(9))
//!     .with_metadata("owner", "etl");
//!
//! let summary = write.write_all(&fs, &["a", "b", "c"])?;
//! assert_eq!(summary.paths.len(), 4);
//! # Ok(())
//! # }
//! ```

use crate::io::avro::codec::{AvroCodec, resolve_for_write};
use crate::io::avro::metadata::{Metadata, MetadataValue, validate_key};
use crate::io::avro::shard::{ShardCount, ShardNameTemplate, shard_paths};
use crate::io::fs::helpers::{parse_path_uri, split_parent};
use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind, FileSystem};
use apache_avro::error::Details;
use apache_avro::types::Value;
use apache_avro::{Schema, Writer};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const DEFAULT_WRITE_NAME: &str = "AvroIO.Write";

/// Configuration of a sharded write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvroWrite {
    name: String,
    prefix: String,
    #[serde(with = "crate::io::avro::schema::serde_schema")]
    schema: Option<Schema>,
    shard_count: ShardCount,
    template: ShardNameTemplate,
    suffix: String,
    codec: AvroCodec,
    metadata: Metadata,
    validate: bool,
}

impl AvroWrite {
    /// Start a write to `prefix`.
    pub fn to(prefix: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_WRITE_NAME.to_string(),
            prefix: prefix.into(),
            schema: None,
            shard_count: ShardCount::Auto,
            template: ShardNameTemplate::default(),
            suffix: String::new(),
            codec: AvroCodec::Null,
            metadata: Metadata::new(),
            validate: true,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Parse and set the schema from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the JSON is not a valid schema.
    pub fn with_schema_str(self, json: &str) -> DatasetResult<Self> {
        let schema = Schema::parse_str(json).map_err(|e| {
            DatasetError::new(ErrorKind::InvalidInput, format!("invalid schema: {e}"))
        })?;
        Ok(self.with_schema(schema))
    }

    /// Write exactly `n` shards; `0` restores automatic selection.
    #[must_use]
    pub fn with_num_shards(mut self, n: usize) -> Self {
        self.shard_count = ShardCount::from_requested(n);
        self
    }

    /// Write a single file named `prefix + suffix`.
    #[must_use]
    pub fn without_sharding(mut self) -> Self {
        self.shard_count = ShardCount::Fixed(1);
        self.template = ShardNameTemplate::new("");
        self
    }

    #[must_use]
    pub fn with_shard_name_template(mut self, template: impl Into<String>) -> Self {
        self.template = ShardNameTemplate::new(template);
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: AvroCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Add one metadata entry; a repeated key replaces the earlier value.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace all metadata.
    #[must_use]
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Skip the pre-flight check of the output location.
    #[must_use]
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    #[must_use]
    pub fn shard_count(&self) -> ShardCount {
        self.shard_count
    }

    #[must_use]
    pub fn shard_name_template(&self) -> &str {
        self.template.as_str()
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    #[must_use]
    pub fn codec(&self) -> AvroCodec {
        self.codec
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub fn needs_validation(&self) -> bool {
        self.validate
    }

    /// Paths the write would produce for `shard_count` shards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the template cannot name that many distinct files.
    pub fn shard_paths(&self, shard_count: usize) -> DatasetResult<Vec<String>> {
        shard_paths(&self.prefix, &self.template, &self.suffix, shard_count)
    }

    /// Checks that must pass before any file is touched.
    ///
    /// Schema, codec, metadata keys, and a non-empty prefix are always required. With
    /// validation enabled the prefix must also be a well-formed path whose parent the
    /// filesystem can list. A parent that does not exist yet is fine, as is a prefix
    /// matching zero existing files.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for configuration problems and `DestinationUnwritable` when
    /// the filesystem cannot address the output location.
    pub fn validate(&self, fs: &dyn FileSystem) -> DatasetResult<()> {
        self.preflight(fs).map(|_| ())
    }

    fn preflight(&self, fs: &dyn FileSystem) -> DatasetResult<&Schema> {
        let schema = self.schema.as_ref().ok_or_else(|| {
            DatasetError::new(
                ErrorKind::InvalidInput,
                format!("{}: no schema set; call with_schema first", self.name),
            )
        })?;
        resolve_for_write(Some(self.codec))?;
        for key in self.metadata.keys() {
            validate_key(key)?;
        }
        if self.prefix.is_empty() {
            return Err(DatasetError::new(
                ErrorKind::InvalidInput,
                "Output prefix cannot be empty",
            ));
        }
        if self.validate {
            self.check_destination(fs)?;
        }
        Ok(schema)
    }

    fn check_destination(&self, fs: &dyn FileSystem) -> DatasetResult<()> {
        parse_path_uri(&self.prefix)?;
        let Some((parent, _)) = split_parent(&self.prefix) else {
            return Ok(());
        };
        match fs.list(parent) {
            Ok(_) => Ok(()),
            Err(e) if e.kind == ErrorKind::PathNotFound => Ok(()),
            Err(e) => Err(DatasetError::new(
                ErrorKind::DestinationUnwritable,
                format!("{}: cannot address output location: {}", self.name, e.message),
            )
            .with_source(&self.prefix)),
        }
    }

    /// Open a writer. `estimated_bytes` drives automatic shard selection and is ignored
    /// for fixed counts.
    ///
    /// Shard paths are computed here; files are created on first write (or at close for
    /// shards that receive nothing).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if validation fails or the template cannot name the
    /// resolved number of shards.
    pub fn open<'a>(
        &'a self,
        fs: &'a dyn FileSystem,
        estimated_bytes: u64,
    ) -> DatasetResult<ShardedWriter<'a>> {
        let schema = self.preflight(fs)?;
        let count = self.shard_count.resolve(estimated_bytes);
        let paths = self.shard_paths(count)?;
        debug!(
            "{}: opening {count} shard(s) under {} ({:?}, codec {})",
            self.name, self.prefix, self.shard_count, self.codec
        );
        Ok(ShardedWriter {
            config: self,
            schema,
            fs,
            shards: paths.iter().map(|_| None).collect(),
            paths,
            next: 0,
        })
    }

    /// Write `records` and close.
    ///
    /// With automatic sharding the estimate is the total encoded size of the records.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if a record does not fit the schema, `DestinationUnwritable` if a
    /// shard cannot be written, or a validation error.
    pub fn write_all<T: Serialize>(
        &self,
        fs: &dyn FileSystem,
        records: &[T],
    ) -> DatasetResult<WriteSummary> {
        let schema = self.preflight(fs)?;
        let values = records
            .iter()
            .map(|r| to_resolved_value(r, schema))
            .collect::<DatasetResult<Vec<_>>>()?;
        let estimate = self.estimate_bytes(schema, &values)?;

        let mut writer = self.open(fs, estimate)?;
        for value in values {
            writer.write_value(value)?;
        }
        writer.close()
    }

    /// Like [`write_all`](Self::write_all) but writes shards concurrently. Each worker owns
    /// the handle of the shard it writes.
    ///
    /// # Errors
    ///
    /// As for [`write_all`](Self::write_all). When several shards fail, one of the errors is
    /// returned; shards that finished stay in place.
    #[cfg(feature = "parallel-io")]
    pub fn write_all_par<T: Serialize + Sync>(
        &self,
        fs: &dyn FileSystem,
        records: &[T],
    ) -> DatasetResult<WriteSummary> {
        use rayon::prelude::*;

        let schema = self.preflight(fs)?;
        let values = records
            .par_iter()
            .map(|r| to_resolved_value(r, schema))
            .collect::<DatasetResult<Vec<_>>>()?;
        let estimate = self.estimate_bytes(schema, &values)?;
        let count = self.shard_count.resolve(estimate);
        let paths = self.shard_paths(count)?;

        let mut buckets: Vec<Vec<Value>> = vec![Vec::new(); count];
        for (i, value) in values.into_iter().enumerate() {
            buckets[i % count].push(value);
        }

        let records_per_shard = paths
            .par_iter()
            .zip(buckets.into_par_iter())
            .map(|(path, bucket)| {
                let mut shard = ShardHandle::create(fs, path, schema, self)?;
                for value in bucket {
                    shard.append(value)?;
                }
                shard.finish()
            })
            .collect::<DatasetResult<Vec<u64>>>()?;

        let summary = WriteSummary {
            paths,
            records_per_shard,
        };
        info!("{}: wrote {} records to {} shard(s)", self.name, summary.total_records(), count);
        Ok(summary)
    }

    fn estimate_bytes(&self, schema: &Schema, values: &[Value]) -> DatasetResult<u64> {
        if self.shard_count != ShardCount::Auto {
            return Ok(0);
        }
        let mut total = 0u64;
        for value in values {
            total += apache_avro::to_avro_datum(schema, value.clone())?.len() as u64;
        }
        Ok(total)
    }
}

/// Serialize a record and resolve it against the schema (wrapping union branches etc.).
pub(crate) fn to_resolved_value<T: Serialize>(record: &T, schema: &Schema) -> DatasetResult<Value> {
    let value = apache_avro::to_value(record)?;
    value.resolve(schema).map_err(|e| {
        DatasetError::new(
            ErrorKind::Encoding,
            format!("record does not match the write schema: {e}"),
        )
    })
}

/// Result of a completed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// Shard paths in index order.
    pub paths: Vec<String>,
    pub records_per_shard: Vec<u64>,
}

impl WriteSummary {
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.records_per_shard.iter().sum()
    }
}

/// Handle over all shards of one write. Single-writer: hand each worker its own
/// [`ShardedWriter`] (or use `write_all_par`) rather than sharing one.
///
/// Dropping the writer without calling [`close`](Self::close) releases every file handle
/// but leaves unfinished shards incomplete.
pub struct ShardedWriter<'a> {
    config: &'a AvroWrite,
    schema: &'a Schema,
    fs: &'a dyn FileSystem,
    paths: Vec<String>,
    shards: Vec<Option<ShardHandle<'a>>>,
    next: usize,
}

impl<'a> ShardedWriter<'a> {
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.paths.len()
    }

    /// Paths of every shard, in index order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Serialize and append one record.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if the record does not fit the schema, or
    /// `DestinationUnwritable` if its shard cannot be created or written.
    pub fn write<T: Serialize>(&mut self, record: &T) -> DatasetResult<()> {
        let value = to_resolved_value(record, self.schema)?;
        self.write_value(value)
    }

    /// Append a value already shaped like the schema.
    ///
    /// # Errors
    ///
    /// As for [`write`](Self::write).
    pub fn write_value(&mut self, value: Value) -> DatasetResult<()> {
        let index = self.next % self.paths.len();
        self.next += 1;
        let shard = self.take_or_create(index)?;
        self.shards[index].insert(shard).append(value)
    }

    fn take_or_create(&mut self, index: usize) -> DatasetResult<ShardHandle<'a>> {
        match self.shards[index].take() {
            Some(shard) => Ok(shard),
            None => ShardHandle::create(self.fs, &self.paths[index], self.schema, self.config),
        }
    }

    /// Flush and close every shard in index order, creating empty shards as needed.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Shards closed before it are complete and readable; the
    /// rest are released as they are.
    pub fn close(mut self) -> DatasetResult<WriteSummary> {
        let mut records_per_shard = Vec::with_capacity(self.paths.len());
        for index in 0..self.paths.len() {
            records_per_shard.push(self.take_or_create(index)?.finish()?);
        }
        let summary = WriteSummary {
            paths: std::mem::take(&mut self.paths),
            records_per_shard,
        };
        info!(
            "{}: wrote {} records to {} shard(s)",
            self.config.name,
            summary.total_records(),
            summary.paths.len()
        );
        Ok(summary)
    }
}

/// One open shard file.
struct ShardHandle<'a> {
    path: String,
    writer: Writer<'a, Box<dyn Write + Send>>,
    records: u64,
}

impl<'a> ShardHandle<'a> {
    fn create(
        fs: &dyn FileSystem,
        path: &str,
        schema: &'a Schema,
        config: &AvroWrite,
    ) -> DatasetResult<Self> {
        let out = fs.create(path).map_err(|e| unwritable(&e.message, path))?;
        let mut writer = Writer::with_codec(schema, out, config.codec.to_avro());
        for (key, value) in &config.metadata {
            writer.add_user_metadata(key.clone(), value.to_bytes())?;
        }
        debug!("opened shard {path}");
        Ok(Self {
            path: path.to_string(),
            writer,
            records: 0,
        })
    }

    fn append(&mut self, value: Value) -> DatasetResult<()> {
        self.writer.append(value).map_err(|e| match e.details() {
            // A value that does not fit the schema says nothing about the destination.
            Details::Validation | Details::ValidationWithReason { .. } => {
                DatasetError::from(e).with_source(&self.path)
            }
            _ => unwritable(&e.to_string(), &self.path),
        })?;
        self.records += 1;
        Ok(())
    }

    fn finish(self) -> DatasetResult<u64> {
        let Self {
            path,
            writer,
            records,
        } = self;
        let mut out = writer
            .into_inner()
            .map_err(|e| unwritable(&e.to_string(), &path))?;
        out.flush().map_err(|e| unwritable(&e.to_string(), &path))?;
        debug!("closed shard {path} ({records} records)");
        Ok(records)
    }
}

fn unwritable(message: &str, path: &str) -> DatasetError {
    DatasetError::new(ErrorKind::DestinationUnwritable, message).with_source(path)
}
