//! Container header parsing.
//!
//! The header is the magic `Obj\x01`, a metadata map of `string -> bytes` (Avro
//! map encoding: zig-zag varint block counts, length-prefixed keys and values, a zero
//! count to finish), and a 16-byte sync marker. Only the map is interpreted here; record
//! blocks are left to `apache-avro`.

use crate::io::avro::codec::AvroCodec;
use crate::io::avro::metadata::RESERVED_PREFIX;
use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use apache_avro::Schema;
use std::collections::BTreeMap;
use std::io::{self, Read};

pub const MAGIC: &[u8; 4] = b"Obj\x01";
pub const SYNC_SIZE: usize = 16;
pub const SCHEMA_KEY: &str = "avro.schema";
pub const CODEC_KEY: &str = "avro.codec";

/// Longest metadata key or value accepted, to stop garbage from allocating wildly.
const MAX_ENTRY_LEN: i64 = 64 * 1024 * 1024;

/// Everything the header of one container file says about it.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    schema: Schema,
    codec: AvroCodec,
    sync: [u8; SYNC_SIZE],
    metadata: BTreeMap<String, Vec<u8>>,
    len: u64,
}

impl ContainerHeader {
    /// Parse a header from the start of `reader`, leaving it positioned at the first block.
    ///
    /// # Errors
    ///
    /// - `MalformedContainerHeader` for a bad magic, a truncated or corrupt map, or an
    ///   unparsable schema
    /// - `UnsupportedCodec` when `avro.codec` names a codec this build cannot decode
    pub fn read_from<R: Read>(reader: R) -> DatasetResult<Self> {
        let mut r = CountingReader { inner: reader, count: 0 };

        let mut magic = [0u8; 4];
        read_exact(&mut r, &mut magic)?;
        if &magic != MAGIC {
            return Err(malformed(format!("bad magic {magic:02x?}")));
        }

        let mut metadata = BTreeMap::new();
        loop {
            let mut count = read_long(&mut r)?;
            if count == 0 {
                break;
            }
            if count < 0 {
                count = count
                    .checked_neg()
                    .ok_or_else(|| malformed("metadata block count overflow"))?;
                // Block byte size; not needed when reading sequentially.
                read_long(&mut r)?;
            }
            for _ in 0..count {
                let key = String::from_utf8(read_bytes(&mut r)?)
                    .map_err(|_| malformed("metadata key is not UTF-8"))?;
                let value = read_bytes(&mut r)?;
                metadata.insert(key, value);
            }
        }

        let mut sync = [0u8; SYNC_SIZE];
        read_exact(&mut r, &mut sync)?;

        let schema_json = metadata
            .get(SCHEMA_KEY)
            .ok_or_else(|| malformed("header has no avro.schema entry"))?;
        let schema_json = std::str::from_utf8(schema_json)
            .map_err(|_| malformed("avro.schema is not UTF-8"))?;
        let schema = Schema::parse_str(schema_json)
            .map_err(|e| malformed(format!("cannot parse writer schema: {e}")))?;

        let codec = match metadata.get(CODEC_KEY) {
            None => AvroCodec::Null,
            Some(name) => {
                let name = std::str::from_utf8(name)
                    .map_err(|_| malformed("avro.codec is not UTF-8"))?;
                AvroCodec::from_header_name(name)?
            }
        };

        Ok(Self {
            schema,
            codec,
            sync,
            metadata,
            len: r.count,
        })
    }

    /// Writer schema embedded in the file.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Block codec named by the header (at its default level; levels are not recorded).
    #[must_use]
    pub fn codec(&self) -> AvroCodec {
        self.codec
    }

    #[must_use]
    pub fn sync_marker(&self) -> &[u8; SYNC_SIZE] {
        &self.sync
    }

    /// Byte length of the header; the first block starts here.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All header entries, reserved ones included.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.metadata
    }

    /// Entries written by the user (no `avro.` prefix).
    pub fn user_metadata(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.metadata
            .iter()
            .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn meta_bytes(&self, key: &str) -> Option<&[u8]> {
        self.metadata.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn meta_string(&self, key: &str) -> Option<&str> {
        self.meta_bytes(key).and_then(|b| std::str::from_utf8(b).ok())
    }

    #[must_use]
    pub fn meta_long(&self, key: &str) -> Option<i64> {
        self.meta_string(key).and_then(|s| s.parse().ok())
    }
}

fn malformed(message: impl Into<String>) -> DatasetError {
    DatasetError::new(ErrorKind::MalformedContainerHeader, message)
}

struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> DatasetResult<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => malformed("truncated container header"),
        _ => DatasetError::from(e),
    })
}

/// Decode one zig-zag varint `long`.
pub(crate) fn read_long<R: Read>(r: &mut R) -> DatasetResult<i64> {
    let mut raw: u64 = 0;
    let mut shift = 0;
    loop {
        let mut byte = [0u8; 1];
        read_exact(r, &mut byte)?;
        raw |= u64::from(byte[0] & 0x7f) << shift;
        if byte[0] & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift > 63 {
            return Err(malformed("varint longer than 10 bytes"));
        }
    }
    Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
}

fn read_bytes<R: Read>(r: &mut R) -> DatasetResult<Vec<u8>> {
    let len = read_long(r)?;
    if !(0..=MAX_ENTRY_LEN).contains(&len) {
        return Err(malformed(format!("invalid metadata entry length {len}")));
    }
    let mut buf = vec![0u8; usize::try_from(len).unwrap_or(0)];
    read_exact(r, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_long(v: i64) -> Vec<u8> {
        let mut z = ((v << 1) ^ (v >> 63)) as u64;
        let mut out = Vec::new();
        loop {
            if z & !0x7f == 0 {
                out.push(z as u8);
                return out;
            }
            out.push((z & 0x7f | 0x80) as u8);
            z >>= 7;
        }
    }

    fn encode_bytes(b: &[u8]) -> Vec<u8> {
        let mut out = encode_long(b.len() as i64);
        out.extend_from_slice(b);
        out
    }

    fn header_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        out.extend(encode_long(entries.len() as i64));
        for (k, v) in entries {
            out.extend(encode_bytes(k.as_bytes()));
            out.extend(encode_bytes(v));
        }
        out.extend(encode_long(0));
        out.extend([7u8; SYNC_SIZE]);
        out
    }

    #[test]
    fn test_read_long() {
        for v in [0i64, 1, -1, 63, -64, 64, 300, i64::MAX, i64::MIN] {
            let bytes = encode_long(v);
            assert_eq!(read_long(&mut bytes.as_slice()).unwrap(), v);
        }
    }

    #[test]
    fn test_parse_header() {
        let bytes = header_with(&[
            (SCHEMA_KEY, br#""string""#),
            (CODEC_KEY, b"deflate"),
            ("owner", b"etl"),
        ]);
        let header = ContainerHeader::read_from(bytes.as_slice()).unwrap();
        assert_eq!(header.schema(), &Schema::String);
        assert_eq!(header.codec().header_name(), "deflate");
        assert_eq!(header.sync_marker(), &[7u8; SYNC_SIZE]);
        assert_eq!(header.len(), bytes.len() as u64);
        assert_eq!(header.meta_string("owner"), Some("etl"));
        assert_eq!(header.user_metadata().count(), 1);
    }

    #[test]
    fn test_missing_codec_means_null() {
        let bytes = header_with(&[(SCHEMA_KEY, br#""long""#)]);
        let header = ContainerHeader::read_from(bytes.as_slice()).unwrap();
        assert_eq!(header.codec(), AvroCodec::Null);
    }

    #[test]
    fn test_bad_magic() {
        let err = ContainerHeader::read_from(&b"PAR1xxxx"[..]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedContainerHeader);
    }

    #[test]
    fn test_truncated() {
        let bytes = header_with(&[(SCHEMA_KEY, br#""string""#)]);
        let err = ContainerHeader::read_from(&bytes[..bytes.len() - 4]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedContainerHeader);
    }

    #[test]
    fn test_unknown_codec() {
        let bytes = header_with(&[(SCHEMA_KEY, br#""string""#), (CODEC_KEY, b"lzo")]);
        let err = ContainerHeader::read_from(bytes.as_slice()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedCodec);
    }
}
