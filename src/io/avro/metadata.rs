//! User metadata embedded in container headers.

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header keys with this prefix belong to the container format.
pub const RESERVED_PREFIX: &str = "avro.";

/// A metadata value as supplied by the writer.
///
/// Headers store raw bytes. Strings are stored as UTF-8 and longs as their decimal
/// text, so [`ContainerHeader::meta_long`](super::header::ContainerHeader::meta_long)
/// reads back what was written here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataValue {
    String(String),
    Long(i64),
    Bytes(Vec<u8>),
}

impl MetadataValue {
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::String(s) => s.as_bytes().to_vec(),
            Self::Long(v) => v.to_string().into_bytes(),
            Self::Bytes(b) => b.clone(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for MetadataValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// Keyed metadata; a map keeps keys unique.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Reject empty and reserved keys.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty key or one starting with `avro.`.
pub fn validate_key(key: &str) -> DatasetResult<()> {
    if key.is_empty() {
        return Err(DatasetError::new(
            ErrorKind::InvalidInput,
            "Metadata key cannot be empty",
        ));
    }
    if key.starts_with(RESERVED_PREFIX) {
        return Err(DatasetError::new(
            ErrorKind::InvalidInput,
            format!("Metadata key '{key}' uses the reserved '{RESERVED_PREFIX}' prefix"),
        ));
    }
    Ok(())
}
