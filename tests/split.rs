//! Block scanning, splitting, and range reads.

use anyhow::Result;
use ironshard::io::avro::blocks::scan_blocks;
use ironshard::io::avro::header::ContainerHeader;
use ironshard::testing::*;
use ironshard::{AvroRead, BlockRange, ErrorKind, SeekableInput};

/// Enough records that the encoder emits several blocks per file.
const MANY: usize = 6_000;

#[test]
fn test_scan_blocks_covers_file() -> Result<()> {
    let (fs, summary) = memory_dataset("mem://b/big/part", &test_records(MANY), 1)?;
    let path = &summary.paths[0];

    let mut input = SeekableInput::open(&fs, path)?;
    let header = ContainerHeader::read_from(&mut input)?;
    let blocks = scan_blocks(&mut input, &header)?;

    assert!(blocks.len() > 1, "expected several blocks, got {}", blocks.len());
    assert_eq!(blocks[0].offset, header.len());
    for pair in blocks.windows(2) {
        assert_eq!(pair[0].offset + pair[0].len, pair[1].offset);
    }
    let last = blocks[blocks.len() - 1];
    assert_eq!(last.offset + last.len, input.length());
    assert_eq!(blocks.iter().map(|b| b.record_count).sum::<u64>(), MANY as u64);
    Ok(())
}

#[test]
fn test_split_and_read_ranges_cover_every_record_once() -> Result<()> {
    let records = test_records(MANY);
    let (fs, _) = memory_dataset("mem://b/big/part", &records, 3)?;
    let read = AvroRead::from("mem://b/big");

    let ranges = read.split(&fs, 1_000)?;
    assert!(ranges.len() > 3);
    assert_eq!(ranges.iter().map(|r| r.record_count).sum::<u64>(), MANY as u64);

    let mut back: Vec<TestRecord> = Vec::new();
    for range in &ranges {
        let part: Vec<TestRecord> = read.read_range(&fs, range)?;
        assert_eq!(part.len() as u64, range.record_count);
        back.extend(part);
    }
    assert_contains_in_any_order(&back, &records);
    Ok(())
}

#[test]
fn test_huge_bundle_is_one_range_per_file() -> Result<()> {
    let (fs, summary) = memory_dataset("mem://b/big/part", &test_records(MANY), 2)?;
    let ranges = AvroRead::from("mem://b/big").split(&fs, u64::MAX)?;
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].path, summary.paths[0]);
    assert_eq!(ranges[1].path, summary.paths[1]);
    Ok(())
}

#[test]
fn test_empty_shard_has_no_ranges() -> Result<()> {
    let (fs, _) = memory_dataset("mem://b/few/part", &test_records(1), 2)?;
    let ranges = AvroRead::from("mem://b/few").split(&fs, 1024)?;
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].record_count, 1);
    Ok(())
}

#[test]
fn test_range_outside_block_area_rejected() -> Result<()> {
    let (fs, summary) = memory_dataset("mem://b/r/part", &test_records(10), 1)?;
    let bogus = BlockRange {
        path: summary.paths[0].clone(),
        start: 0,
        end: 4,
        record_count: 0,
    };
    let err = AvroRead::from("mem://b/r")
        .read_range::<TestRecord>(&fs, &bogus)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
    Ok(())
}

#[test]
fn test_corrupt_sync_marker_detected() -> Result<()> {
    let (fs, summary) = memory_dataset("mem://b/c/part", &test_records(10), 1)?;
    let path = &summary.paths[0];
    let mut bytes = fs.get(path).unwrap_or_default();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs.put(path, bytes);

    let err = AvroRead::from("mem://b/c").split(&fs, 1024).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedContainerHeader);
    assert_eq!(err.source.as_deref(), Some(path.as_str()));
    Ok(())
}
