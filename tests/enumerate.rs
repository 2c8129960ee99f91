//! Dataset enumeration over the in-memory backend.

use anyhow::Result;
use ironshard::io::enumerate::{enumerate, is_hidden, sorted_paths, sorted_paths_required};
use ironshard::testing::assert_dataset_files;
use ironshard::{CodecRegistry, ErrorKind, InMemoryFileSystem};

fn dataset() -> InMemoryFileSystem {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/out/part-00000-of-00002.avro", b"a".to_vec());
    fs.put("mem://b/out/part-00001-of-00002.avro", b"bb".to_vec());
    fs.put("mem://b/out/_SUCCESS", Vec::new());
    fs.put("mem://b/out/_temporary/attempt-0", b"x".to_vec());
    fs.put("mem://b/out/.part-00000-of-00002.avro.crc", b"crc".to_vec());
    fs.put("mem://b/out/nested/deeper.avro", b"n".to_vec());
    fs.put("mem://b/logs/events.json.gz", b"z".to_vec());
    fs
}

#[test]
fn test_directory_skips_housekeeping_and_subdirs() -> Result<()> {
    let fs = dataset();
    assert_dataset_files(
        &fs,
        "mem://b/out",
        &["part-00000-of-00002.avro", "part-00001-of-00002.avro"],
    );
    Ok(())
}

#[test]
fn test_entries_carry_length() -> Result<()> {
    let fs = dataset();
    let mut entries = enumerate(&fs, &CodecRegistry::default(), "mem://b/out")?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].len, 1);
    assert_eq!(entries[1].len, 2);
    assert!(entries.iter().all(|e| !e.is_dir));
    Ok(())
}

#[test]
fn test_glob_matches_names() -> Result<()> {
    let fs = dataset();
    let paths = sorted_paths(&fs, &CodecRegistry::default(), "mem://b/out/part-*-of-00002.avro")?;
    assert_eq!(
        paths,
        vec![
            "mem://b/out/part-00000-of-00002.avro".to_string(),
            "mem://b/out/part-00001-of-00002.avro".to_string(),
        ]
    );

    let only_second = sorted_paths(&fs, &CodecRegistry::default(), "mem://b/out/part-0000[1]*")?;
    assert_eq!(only_second.len(), 1);
    Ok(())
}

#[test]
fn test_glob_never_returns_hidden_files() -> Result<()> {
    let fs = dataset();
    let paths = sorted_paths(&fs, &CodecRegistry::default(), "mem://b/out/*")?;
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|p| !p.contains("/_") && !p.contains("/.")));
    Ok(())
}

#[test]
fn test_glob_without_matches_is_empty() -> Result<()> {
    let fs = dataset();
    let paths = sorted_paths(&fs, &CodecRegistry::default(), "mem://b/out/*.parquet")?;
    assert!(paths.is_empty());

    let err = sorted_paths_required(&fs, &CodecRegistry::default(), "mem://b/out/*.parquet")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PathNotFound);
    Ok(())
}

#[test]
fn test_single_file_location() -> Result<()> {
    let fs = dataset();
    let paths = sorted_paths(
        &fs,
        &CodecRegistry::default(),
        "mem://b/out/part-00001-of-00002.avro",
    )?;
    assert_eq!(paths, vec!["mem://b/out/part-00001-of-00002.avro".to_string()]);

    // A hidden file named directly is still filtered out.
    let hidden = sorted_paths(&fs, &CodecRegistry::default(), "mem://b/out/_SUCCESS")?;
    assert!(hidden.is_empty());
    Ok(())
}

#[test]
fn test_missing_location() {
    let fs = dataset();
    let err = enumerate(&fs, &CodecRegistry::default(), "mem://b/missing").unwrap_err();
    assert_eq!(err.kind, ErrorKind::PathNotFound);

    let err = enumerate(&fs, &CodecRegistry::default(), "mem://b/out/absent.avro").unwrap_err();
    assert_eq!(err.kind, ErrorKind::PathNotFound);
}

#[test]
fn test_codec_hint() -> Result<()> {
    let fs = dataset();
    let entries = enumerate(&fs, &CodecRegistry::default(), "mem://b/logs")?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].codec_hint.as_deref(), Some("gzip"));

    let plain = enumerate(&fs, &CodecRegistry::default(), "mem://b/out")?;
    assert!(plain.iter().all(|e| e.codec_hint.is_none()));
    Ok(())
}

#[test]
fn test_enumeration_is_fresh_each_call() -> Result<()> {
    let fs = dataset();
    let registry = CodecRegistry::default();
    assert_eq!(sorted_paths(&fs, &registry, "mem://b/out")?.len(), 2);
    fs.put("mem://b/out/part-late.avro", b"late".to_vec());
    assert_eq!(sorted_paths(&fs, &registry, "mem://b/out")?.len(), 3);
    Ok(())
}

#[test]
fn test_is_hidden() {
    assert!(is_hidden("_SUCCESS"));
    assert!(is_hidden(".crc"));
    assert!(!is_hidden("part-0"));
    assert!(!is_hidden("my_file"));
}
