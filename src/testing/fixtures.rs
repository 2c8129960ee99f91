//! Pre-built records, schemas, and datasets for common testing scenarios.

use serde::{Deserialize, Serialize};

/// Schema of [`TestRecord`].
pub const TEST_RECORD_SCHEMA: &str = r#"{
    "type": "record",
    "name": "TestRecord",
    "namespace": "ironshard.testing",
    "fields": [
        {"name": "intField", "type": "int"},
        {"name": "stringField", "type": "string"}
    ]
}"#;

/// Schema of [`TestRecordV2`]: [`TEST_RECORD_SCHEMA`] plus a nullable field with a
/// default, so files written with the first version stay readable.
pub const TEST_RECORD_V2_SCHEMA: &str = r#"{
    "type": "record",
    "name": "TestRecord",
    "namespace": "ironshard.testing",
    "fields": [
        {"name": "intField", "type": "int"},
        {"name": "stringField", "type": "string"},
        {"name": "nullableField", "type": ["null", "string"], "default": null}
    ]
}"#;

/// A small two-field record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(rename = "intField")]
    pub int_field: i32,
    #[serde(rename = "stringField")]
    pub string_field: String,
}

impl TestRecord {
    pub fn new(int_field: i32, string_field: impl Into<String>) -> Self {
        Self {
            int_field,
            string_field: string_field.into(),
        }
    }
}

/// [`TestRecord`] after adding `nullableField`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestRecordV2 {
    #[serde(rename = "intField")]
    pub int_field: i32,
    #[serde(rename = "stringField")]
    pub string_field: String,
    #[serde(rename = "nullableField")]
    pub nullable_field: Option<String>,
}

/// `n` distinct records: `(i, "record-i")`.
///
/// # Example
///
/// ```
/// use ironshard::testing::test_records;
///
/// let records = test_records(3);
/// assert_eq!(records[2].string_field, "record-2");
/// ```
#[must_use]
pub fn test_records(n: usize) -> Vec<TestRecord> {
    (0..n)
        .map(|i| TestRecord::new(i32::try_from(i).unwrap_or(i32::MAX), format!("record-{i}")))
        .collect()
}

/// Write `records` as a sharded dataset into a fresh in-memory filesystem.
///
/// Shards are named `prefix-SSSSS-of-NNNNN.avro`.
///
/// # Errors
///
/// Returns an error if the schema does not parse or a record does not fit it.
///
/// # Example
///
/// ```
/// use ironshard::testing::*;
///
/// # fn main() -> ironshard::DatasetResult<()> {
/// let (fs, summary) = memory_dataset("mem://test/out/part", &test_records(10), 3)?;
/// assert_eq!(summary.paths.len(), 3);
/// assert_dataset_files(&fs, "mem://test/out", &[
///     "part-00000-of-00003.avro",
///     "part-00001-of-00003.avro",
///     "part-00002-of-00003.avro",
/// ]);
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "io-avro")]
pub fn memory_dataset(
    prefix: &str,
    records: &[TestRecord],
    shards: usize,
) -> crate::DatasetResult<(crate::io::fs::InMemoryFileSystem, crate::io::avro::WriteSummary)> {
    let fs = crate::io::fs::InMemoryFileSystem::new();
    let summary = crate::io::avro::AvroWrite::to(prefix)
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .with_num_shards(shards)
        .with_suffix(".avro")
        .write_all(&fs, records)?;
    Ok((fs, summary))
}
