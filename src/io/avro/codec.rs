//! Container block codecs.
//!
//! The codec chosen at write time is recorded in every file's header under `avro.codec`;
//! readers always decode with the header's value.

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use apache_avro::{Bzip2Settings, Codec, DeflateSettings, XzSettings, ZstandardSettings};
use miniz_oxide::deflate::CompressionLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DEFLATE_LEVEL: u8 = 6;
pub const DEFAULT_ZSTANDARD_LEVEL: u8 = 3;
pub const DEFAULT_BZIP2_LEVEL: u8 = 9;
pub const DEFAULT_XZ_LEVEL: u8 = 6;

/// Block codec for a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "codec", rename_all = "lowercase")]
pub enum AvroCodec {
    #[default]
    Null,
    Deflate { level: u8 },
    Snappy,
    Zstandard { level: u8 },
    Bzip2 { level: u8 },
    Xz { level: u8 },
}

impl AvroCodec {
    #[must_use]
    pub fn deflate(level: u8) -> Self {
        Self::Deflate { level }
    }

    #[must_use]
    pub fn zstandard(level: u8) -> Self {
        Self::Zstandard { level }
    }

    #[must_use]
    pub fn bzip2(level: u8) -> Self {
        Self::Bzip2 { level }
    }

    #[must_use]
    pub fn xz(level: u8) -> Self {
        Self::Xz { level }
    }

    /// The name stored in the `avro.codec` header entry.
    #[must_use]
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Deflate { .. } => "deflate",
            Self::Snappy => "snappy",
            Self::Zstandard { .. } => "zstandard",
            Self::Bzip2 { .. } => "bzip2",
            Self::Xz { .. } => "xz",
        }
    }

    #[must_use]
    pub fn level(&self) -> Option<u8> {
        match *self {
            Self::Deflate { level }
            | Self::Zstandard { level }
            | Self::Bzip2 { level }
            | Self::Xz { level } => Some(level),
            Self::Null | Self::Snappy => None,
        }
    }

    /// Codec named by a header entry, at its default level.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCodec` for names this build cannot decode.
    pub fn from_header_name(name: &str) -> DatasetResult<Self> {
        match name {
            "null" => Ok(Self::Null),
            "deflate" => Ok(Self::Deflate {
                level: DEFAULT_DEFLATE_LEVEL,
            }),
            "snappy" => Ok(Self::Snappy),
            "zstandard" => Ok(Self::Zstandard {
                level: DEFAULT_ZSTANDARD_LEVEL,
            }),
            "bzip2" => Ok(Self::Bzip2 {
                level: DEFAULT_BZIP2_LEVEL,
            }),
            "xz" => Ok(Self::Xz {
                level: DEFAULT_XZ_LEVEL,
            }),
            other => Err(DatasetError::new(
                ErrorKind::UnsupportedCodec,
                format!("Unsupported container codec '{other}'"),
            )),
        }
    }

    /// Check the level range for the codec.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the level is outside the codec's range.
    pub fn validate(&self) -> DatasetResult<()> {
        let (range, level) = match *self {
            Self::Null | Self::Snappy => return Ok(()),
            Self::Deflate { level } => (0..=9, level),
            Self::Zstandard { level } => (1..=22, level),
            Self::Bzip2 { level } => (1..=9, level),
            Self::Xz { level } => (0..=9, level),
        };
        if range.contains(&level) {
            Ok(())
        } else {
            Err(DatasetError::new(
                ErrorKind::InvalidInput,
                format!(
                    "{} level {level} outside {}..={}",
                    self.header_name(),
                    range.start(),
                    range.end()
                ),
            ))
        }
    }

    pub(crate) fn to_avro(self) -> Codec {
        match self {
            Self::Null => Codec::Null,
            Self::Deflate { level } => Codec::Deflate(DeflateSettings::new(deflate_level(level))),
            Self::Snappy => Codec::Snappy,
            Self::Zstandard { level } => Codec::Zstandard(ZstandardSettings::new(level)),
            Self::Bzip2 { level } => Codec::Bzip2(Bzip2Settings::new(level)),
            Self::Xz { level } => Codec::Xz(XzSettings::new(level)),
        }
    }
}

fn deflate_level(level: u8) -> CompressionLevel {
    match level {
        0 => CompressionLevel::NoCompression,
        1..=3 => CompressionLevel::BestSpeed,
        4..=8 => CompressionLevel::DefaultLevel,
        _ => CompressionLevel::BestCompression,
    }
}

impl fmt::Display for AvroCodec {
    /// `null`, `snappy`, or `<name>-<level>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level() {
            Some(level) => write!(f, "{}-{level}", self.header_name()),
            None => f.write_str(self.header_name()),
        }
    }
}

impl FromStr for AvroCodec {
    type Err = DatasetError;

    /// Parses the [`Display`](fmt::Display) form; a bare name gets the default level.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, level)) = s.rsplit_once('-') else {
            return Self::from_header_name(s);
        };
        let level: u8 = level.parse().map_err(|_| {
            DatasetError::new(ErrorKind::InvalidInput, format!("Invalid codec level in '{s}'"))
        })?;
        let codec = match Self::from_header_name(name)? {
            Self::Deflate { .. } => Self::Deflate { level },
            Self::Zstandard { .. } => Self::Zstandard { level },
            Self::Bzip2 { .. } => Self::Bzip2 { level },
            Self::Xz { .. } => Self::Xz { level },
            Self::Null | Self::Snappy => {
                return Err(DatasetError::new(
                    ErrorKind::InvalidInput,
                    format!("Codec '{name}' takes no level"),
                ));
            }
        };
        codec.validate()?;
        Ok(codec)
    }
}

/// Write-side codec resolution: the caller's choice, validated, or [`AvroCodec::Null`].
///
/// # Errors
///
/// Returns `InvalidInput` when the requested level is out of range.
pub fn resolve_for_write(explicit: Option<AvroCodec>) -> DatasetResult<AvroCodec> {
    let codec = explicit.unwrap_or_default();
    codec.validate()?;
    Ok(codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        assert_eq!(AvroCodec::Null.to_string(), "null");
        assert_eq!(AvroCodec::deflate(9).to_string(), "deflate-9");
        assert_eq!(AvroCodec::xz(9).to_string(), "xz-9");
        assert_eq!("deflate-9".parse::<AvroCodec>().unwrap(), AvroCodec::deflate(9));
        assert_eq!("snappy".parse::<AvroCodec>().unwrap(), AvroCodec::Snappy);
        assert!("snappy-3".parse::<AvroCodec>().is_err());
        assert!("deflate-42".parse::<AvroCodec>().is_err());
    }

    #[test]
    fn test_unknown_header_name() {
        let err = AvroCodec::from_header_name("lzo").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedCodec);
    }

    #[test]
    fn test_resolve_for_write() {
        assert_eq!(resolve_for_write(None).unwrap(), AvroCodec::Null);
        assert_eq!(
            resolve_for_write(Some(AvroCodec::zstandard(5))).unwrap(),
            AvroCodec::zstandard(5)
        );
        assert_eq!(
            resolve_for_write(Some(AvroCodec::bzip2(0))).unwrap_err().kind,
            ErrorKind::InvalidInput
        );
    }
}
