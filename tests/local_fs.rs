//! Local-disk backend, end to end.

use anyhow::Result;
use ironshard::io::fs::FileSystem;
use ironshard::testing::*;
use ironshard::{AccessMode, AvroCodec, AvroRead, AvroWrite, ErrorKind, FsConfig, LocalFileSystem};
use std::io::{Read, Write};
use tempfile::TempDir;

#[test]
fn test_write_and_read_under_root() -> Result<()> {
    let dir = TempDir::new()?;
    let fs = LocalFileSystem::new(FsConfig::default().with_root(dir.path()));
    let records = test_records(50);

    let summary = AvroWrite::to("nested/out/part")
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .with_num_shards(4)
        .with_suffix(".avro")
        .with_codec(AvroCodec::deflate(9))
        .write_all(&fs, &records)?;
    assert_eq!(summary.paths.len(), 4);
    assert!(dir.path().join("nested/out/part-00003-of-00004.avro").exists());

    std::fs::write(dir.path().join("nested/out/_SUCCESS"), b"")?;

    let back: Vec<TestRecord> = AvroRead::from("nested/out").read(&fs)?;
    assert_contains_in_any_order(&back, &records);

    let seekable: Vec<TestRecord> = AvroRead::from("nested/out")
        .with_access(AccessMode::Seekable)
        .read(&fs)?;
    assert_collections_equal(&seekable, &back);
    Ok(())
}

#[test]
fn test_file_uri_paths() -> Result<()> {
    let dir = TempDir::new()?;
    let fs = LocalFileSystem::default();
    let base = format!("file://{}", dir.path().display());
    let path = format!("{base}/hello.txt");

    let mut w = fs.create(&path)?;
    w.write_all(b"hello")?;
    drop(w);

    assert_eq!(fs.content_length(&path)?, 5);
    let mut s = String::new();
    fs.open(&path)?.read_to_string(&mut s)?;
    assert_eq!(s, "hello");

    let entries = fs.list(&base)?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name(), "hello.txt");
    assert_eq!(entries[0].path, path);
    Ok(())
}

#[test]
fn test_missing_paths() -> Result<()> {
    let dir = TempDir::new()?;
    let fs = LocalFileSystem::new(FsConfig::default().with_root(dir.path()));
    assert_eq!(fs.list("absent").unwrap_err().kind, ErrorKind::PathNotFound);
    assert_eq!(fs.content_length("absent.avro").unwrap_err().kind, ErrorKind::PathNotFound);
    let Err(err) = fs.open("absent.avro") else {
        panic!("expected an error");
    };
    assert_eq!(err.kind, ErrorKind::PathNotFound);
    Ok(())
}

#[test]
fn test_other_schemes_rejected() {
    let fs = LocalFileSystem::default();
    assert_eq!(
        fs.list("s3://bucket/x").unwrap_err().kind,
        ErrorKind::InvalidInput
    );
}

#[test]
fn test_without_parent_dirs_fails_on_missing_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let fs = LocalFileSystem::new(FsConfig::default().with_root(dir.path()).without_parent_dirs());
    let err = AvroWrite::to("missing/dir/part")
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .with_num_shards(1)
        .write_all(&fs, &test_records(1))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DestinationUnwritable);
    Ok(())
}

#[test]
fn test_single_file_written_and_read_by_bare_name() -> Result<()> {
    let dir = TempDir::new()?;
    let fs = LocalFileSystem::new(FsConfig::default().with_root(dir.path()));
    let records = test_records(25);

    let summary = AvroWrite::to("output")
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .without_sharding()
        .with_suffix(".avro")
        .write_all(&fs, &records)?;
    assert_eq!(summary.paths, vec!["output.avro".to_string()]);

    let back: Vec<TestRecord> = AvroRead::from("output.avro").read(&fs)?;
    assert_collections_equal(&back, &records);
    Ok(())
}

#[test]
fn test_bare_directory_name_still_lists() -> Result<()> {
    let dir = TempDir::new()?;
    let fs = LocalFileSystem::new(FsConfig::default().with_root(dir.path()));
    AvroWrite::to("events/part")
        .with_schema_str(TEST_RECORD_SCHEMA)?
        .with_num_shards(2)
        .write_all(&fs, &test_records(10))?;

    let entries = ironshard::enumerate(&fs, &ironshard::CodecRegistry::default(), "events")?;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| !e.is_dir));

    let err = AvroRead::from("absent.avro").read_values(&fs).unwrap_err();
    assert_eq!(err.kind, ErrorKind::PathNotFound);
    Ok(())
}
