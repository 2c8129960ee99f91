//! Builder defaults, immutability, and configuration serde.

use anyhow::Result;
use ironshard::io::avro::ShardCount;
use ironshard::testing::TEST_RECORD_SCHEMA;
use ironshard::{AccessMode, AvroCodec, AvroRead, AvroWrite};

#[test]
fn test_write_defaults() {
    let write = AvroWrite::to("mem://b/out");
    assert_eq!(write.name(), "AvroIO.Write");
    assert_eq!(write.prefix(), "mem://b/out");
    assert_eq!(write.shard_name_template(), "-SSSSS-of-NNNNN");
    assert_eq!(write.suffix(), "");
    assert_eq!(write.codec(), AvroCodec::Null);
    assert_eq!(write.shard_count(), ShardCount::Auto);
    assert!(write.needs_validation());
    assert!(write.schema().is_none());
    assert!(write.metadata().is_empty());
}

#[test]
fn test_write_builder_returns_new_values() -> Result<()> {
    let base = AvroWrite::to("mem://b/out").with_schema_str(TEST_RECORD_SCHEMA)?;
    let custom = base
        .clone()
        .named("WriteClicks")
        .with_codec(AvroCodec::deflate(9))
        .with_num_shards(12)
        .without_validation();

    assert_eq!(custom.name(), "WriteClicks");
    assert_eq!(custom.codec(), AvroCodec::Deflate { level: 9 });
    assert_eq!(custom.shard_count(), ShardCount::Fixed(12));
    assert!(!custom.needs_validation());

    assert_eq!(base.name(), "AvroIO.Write");
    assert_eq!(base.codec(), AvroCodec::Null);
    assert!(base.needs_validation());

    // Zero goes back to automatic sharding.
    assert_eq!(custom.with_num_shards(0).shard_count(), ShardCount::Auto);
    Ok(())
}

#[test]
fn test_shard_paths_preview() -> Result<()> {
    let write = AvroWrite::to("out/events").with_suffix(".avro");
    assert_eq!(
        write.shard_paths(2)?,
        vec![
            "out/events-00000-of-00002.avro".to_string(),
            "out/events-00001-of-00002.avro".to_string(),
        ]
    );
    assert!(write.without_sharding().shard_paths(2).is_err());
    Ok(())
}

#[test]
fn test_codec_display_and_parse() -> Result<()> {
    assert_eq!(AvroCodec::Null.to_string(), "null");
    assert_eq!(AvroCodec::deflate(9).to_string(), "deflate-9");
    assert_eq!(AvroCodec::Snappy.to_string(), "snappy");
    assert_eq!(AvroCodec::xz(6).to_string(), "xz-6");
    assert_eq!("zstandard-3".parse::<AvroCodec>()?, AvroCodec::zstandard(3));
    assert_eq!("bzip2-9".parse::<AvroCodec>()?, AvroCodec::bzip2(9));
    assert!("lzo".parse::<AvroCodec>().is_err());
    Ok(())
}

#[test]
fn test_codec_level_validation() {
    assert!(AvroCodec::deflate(10).validate().is_err());
    assert!(AvroCodec::zstandard(0).validate().is_err());
    assert!(AvroCodec::zstandard(22).validate().is_ok());
    assert!(AvroCodec::bzip2(0).validate().is_err());
    assert!(AvroCodec::xz(9).validate().is_ok());
}

#[test]
fn test_write_config_serde_round_trip() -> Result<()> {
    let write = AvroWrite::to("mem://b/out/part")
        .named("WriteClicks")
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .with_num_shards(5)
        .with_suffix(".avro")
        .with_codec(AvroCodec::zstandard(7))
        .with_metadata("owner", "etl")
        .with_metadata("version", 3i64);

    let json = serde_json::to_string(&write)?;
    let back: AvroWrite = serde_json::from_str(&json)?;

    assert_eq!(back.name(), write.name());
    assert_eq!(back.prefix(), write.prefix());
    assert_eq!(back.codec(), write.codec());
    assert_eq!(back.shard_count(), write.shard_count());
    assert_eq!(back.suffix(), write.suffix());
    assert_eq!(back.metadata(), write.metadata());
    assert_eq!(back.schema(), write.schema());
    Ok(())
}

#[test]
fn test_codec_serde_round_trip() -> Result<()> {
    for codec in [
        AvroCodec::Null,
        AvroCodec::deflate(1),
        AvroCodec::Snappy,
        AvroCodec::zstandard(19),
        AvroCodec::bzip2(4),
        AvroCodec::xz(2),
    ] {
        let json = serde_json::to_string(&codec)?;
        assert_eq!(serde_json::from_str::<AvroCodec>(&json)?, codec);
    }
    Ok(())
}

#[test]
fn test_read_config_serde_round_trip() -> Result<()> {
    let read = AvroRead::from("mem://b/out")
        .named("ReadClicks")
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .with_access(AccessMode::Seekable)
        .without_validation();

    let back: AvroRead = serde_json::from_str(&serde_json::to_string(&read)?)?;
    assert_eq!(back.name(), "ReadClicks");
    assert_eq!(back.location(), "mem://b/out");
    assert_eq!(back.access(), AccessMode::Seekable);
    assert!(!back.needs_validation());
    assert_eq!(back.schema(), read.schema());
    // The registry is not serialized; the default one comes back.
    assert_eq!(back.registry().names(), ironshard::CodecRegistry::default().names());
    Ok(())
}
