//! Random-access reads through the seekable handle.

use anyhow::Result;
use ironshard::{ErrorKind, InMemoryFileSystem, SeekableInput};
use std::io::{Read, Seek, SeekFrom};

fn bytes(n: u8) -> Vec<u8> {
    (0..n).collect()
}

#[test]
fn test_tell_seek_read() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(100));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;
    assert_eq!(input.length(), 100);
    assert_eq!(input.tell()?, 0);

    input.seek(40)?;
    assert_eq!(input.tell()?, 40);
    let mut buf = [0u8; 10];
    assert_eq!(input.read(&mut buf, 0, 10)?, 10);
    assert_eq!(buf, [40, 41, 42, 43, 44, 45, 46, 47, 48, 49]);
    assert_eq!(input.tell()?, 50);
    Ok(())
}

#[test]
fn test_read_into_offset() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(10));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;
    let mut buf = [0xffu8; 6];
    assert_eq!(input.read(&mut buf, 2, 3)?, 3);
    assert_eq!(buf, [0xff, 0xff, 0, 1, 2, 0xff]);
    // max_len larger than the room left in the buffer is capped by the buffer.
    assert_eq!(input.read(&mut buf, 4, 100)?, 2);
    assert_eq!(&buf[4..], &[3, 4]);

    let err = input.read(&mut buf, 7, 1).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
    Ok(())
}

#[test]
fn test_short_read_only_at_eof() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(10));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;
    input.seek(7)?;
    let mut buf = [0u8; 8];
    assert_eq!(input.read(&mut buf, 0, 8)?, 3);
    assert_eq!(input.read(&mut buf, 0, 8)?, 0);
    Ok(())
}

#[test]
fn test_seek_past_end() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(10));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;
    input.seek(1_000)?;
    assert_eq!(input.tell()?, 1_000);
    let mut buf = [0u8; 4];
    assert_eq!(input.read(&mut buf, 0, 4)?, 0);
    Ok(())
}

#[test]
fn test_length_is_snapshot_at_open() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(10));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;
    fs.append("mem://b/f", &[99; 5]);

    assert_eq!(input.length(), 10);
    input.seek(10)?;
    let mut buf = [0u8; 5];
    assert_eq!(input.read(&mut buf, 0, 5)?, 0);

    let reopened = SeekableInput::open(&fs, "mem://b/f")?;
    assert_eq!(reopened.length(), 15);
    Ok(())
}

#[test]
fn test_close_is_idempotent() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(4));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;
    input.close()?;
    input.close()?;
    let mut buf = [0u8; 1];
    assert_eq!(input.read(&mut buf, 0, 1).unwrap_err().kind, ErrorKind::Io);
    Ok(())
}

#[test]
fn test_missing_file() {
    let fs = InMemoryFileSystem::new();
    let Err(err) = SeekableInput::open(&fs, "mem://b/nope") else {
        panic!("expected an error");
    };
    assert_eq!(err.kind, ErrorKind::PathNotFound);
}

#[test]
fn test_std_io_traits() -> Result<()> {
    let fs = InMemoryFileSystem::new();
    fs.put("mem://b/f", bytes(20));
    let mut input = SeekableInput::open(&fs, "mem://b/f")?;

    Seek::seek(&mut input, SeekFrom::End(-5))?;
    let mut tail = Vec::new();
    Read::read_to_end(&mut input, &mut tail)?;
    assert_eq!(tail, vec![15, 16, 17, 18, 19]);

    Seek::seek(&mut input, SeekFrom::Start(2))?;
    Seek::seek(&mut input, SeekFrom::Current(3))?;
    assert_eq!(input.tell()?, 5);
    assert!(Seek::seek(&mut input, SeekFrom::Current(-10)).is_err());
    Ok(())
}
