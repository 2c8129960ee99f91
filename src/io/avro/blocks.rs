//! Block index over a seekable container file.
//!
//! Each data block is `count: long, size: long, payload[size], sync[16]`. Scanning reads
//! only the two varints and the sync marker of each block and seeks over the payload, so
//! the cost is proportional to the number of blocks rather than the file size.

use crate::io::avro::header::{ContainerHeader, SYNC_SIZE, read_long};
use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use crate::io::seekable::SeekableInput;
use serde::{Deserialize, Serialize};

/// Location of one data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Offset of the block's count varint.
    pub offset: u64,
    pub record_count: u64,
    /// Total bytes including varints, payload, and sync marker.
    pub len: u64,
}

/// A contiguous run of blocks in one file, readable independently of the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub path: String,
    pub start: u64,
    pub end: u64,
    pub record_count: u64,
}

/// Walk every block after the header.
///
/// # Errors
///
/// Returns `MalformedContainerHeader` when a block is truncated or its sync marker does
/// not match the header's.
pub fn scan_blocks(
    input: &mut SeekableInput,
    header: &ContainerHeader,
) -> DatasetResult<Vec<BlockInfo>> {
    let length = input.length();
    let mut offset = header.len();
    let mut blocks = Vec::new();

    while offset < length {
        input.seek(offset)?;
        let count = read_long(input)?;
        let size = read_long(input)?;
        if count < 0 || size < 0 {
            return Err(corrupt(input.path(), offset, "negative block count or size"));
        }
        let payload_start = input.tell()?;
        let sync_start = payload_start + size.unsigned_abs();
        if sync_start + SYNC_SIZE as u64 > length {
            return Err(corrupt(input.path(), offset, "block extends past end of file"));
        }

        input.seek(sync_start)?;
        let mut sync = [0u8; SYNC_SIZE];
        let mut filled = 0;
        while filled < SYNC_SIZE {
            let n = input.read(&mut sync, filled, SYNC_SIZE - filled)?;
            if n == 0 {
                return Err(corrupt(input.path(), offset, "truncated sync marker"));
            }
            filled += n;
        }
        if &sync != header.sync_marker() {
            return Err(corrupt(input.path(), offset, "sync marker mismatch"));
        }

        let end = sync_start + SYNC_SIZE as u64;
        blocks.push(BlockInfo {
            offset,
            record_count: count.unsigned_abs(),
            len: end - offset,
        });
        offset = end;
    }
    Ok(blocks)
}

/// Group consecutive blocks into ranges of roughly `desired_bytes` each.
///
/// Every block lands in exactly one range. A file with no blocks yields no ranges.
#[must_use]
pub fn group_blocks(path: &str, blocks: &[BlockInfo], desired_bytes: u64) -> Vec<BlockRange> {
    let desired = desired_bytes.max(1);
    let mut ranges: Vec<BlockRange> = Vec::new();
    for block in blocks {
        match ranges.last_mut() {
            Some(r) if r.end - r.start < desired => {
                r.end = block.offset + block.len;
                r.record_count += block.record_count;
            }
            _ => ranges.push(BlockRange {
                path: path.to_string(),
                start: block.offset,
                end: block.offset + block.len,
                record_count: block.record_count,
            }),
        }
    }
    ranges
}

fn corrupt(path: &str, offset: u64, what: &str) -> DatasetError {
    DatasetError::new(
        ErrorKind::MalformedContainerHeader,
        format!("{what} at offset {offset}"),
    )
    .with_source(path)
}
