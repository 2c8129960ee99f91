//! In-memory filesystem.
//!
//! Files live in a shared map keyed by their full path; directories are implied by path
//! prefixes, the way object stores behave. Clones share the same storage, so a test can
//! hand one clone to a writer and inspect another.

use crate::io::fs::helpers::join;
use crate::io::fs::traits::{
    DatasetError, DatasetResult, ErrorKind, FileEntry, FileSystem, SeekableHandle,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

type FileStorage = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    files: FileStorage,
    read_only: Arc<Mutex<Vec<String>>>,
}

impl InMemoryFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file, replacing any previous content.
    pub fn put(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .insert(normalize(path).to_string(), data.into());
    }

    /// Snapshot of a file's bytes.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .get(normalize(path))
            .cloned()
    }

    /// Append to an existing file (used to simulate writers racing readers).
    pub fn append(&self, path: &str, data: &[u8]) {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .entry(normalize(path).to_string())
            .or_default()
            .extend_from_slice(data);
    }

    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(normalize(path))
    }

    /// All stored paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Reject every `create` under `prefix`.
    pub fn set_read_only(&self, prefix: &str) {
        self.read_only
            .lock()
            .expect("read-only mutex poisoned")
            .push(normalize(prefix).to_string());
    }

    fn is_read_only(&self, path: &str) -> bool {
        self.read_only
            .lock()
            .expect("read-only mutex poisoned")
            .iter()
            .any(|p| path.starts_with(p.as_str()))
    }

    fn snapshot(&self, path: &str) -> DatasetResult<Vec<u8>> {
        self.get(path).ok_or_else(|| DatasetError::not_found(path))
    }
}

fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}

impl FileSystem for InMemoryFileSystem {
    fn list(&self, dir: &str) -> DatasetResult<Vec<FileEntry>> {
        let dir = normalize(dir);
        let prefix = format!("{dir}/");
        let files = self.files.lock().expect("storage mutex poisoned");

        let mut entries = Vec::new();
        let mut subdirs = BTreeSet::new();
        for (path, data) in files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    subdirs.insert(child.to_string());
                }
                None => entries.push(FileEntry::file(path.clone(), data.len() as u64)),
            }
        }
        drop(files);

        if entries.is_empty() && subdirs.is_empty() {
            return Err(DatasetError::new(
                ErrorKind::PathNotFound,
                format!("Directory {dir} not found"),
            ));
        }
        entries.extend(subdirs.into_iter().map(|d| FileEntry::dir(join(dir, &d))));
        Ok(entries)
    }

    fn open(&self, path: &str) -> DatasetResult<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.snapshot(path)?)))
    }

    fn content_length(&self, path: &str) -> DatasetResult<u64> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .get(normalize(path))
            .map(|d| d.len() as u64)
            .ok_or_else(|| DatasetError::not_found(path))
    }

    fn open_seekable(&self, path: &str) -> DatasetResult<Box<dyn SeekableHandle>> {
        Ok(Box::new(MemorySeekableHandle {
            data: self.snapshot(path)?,
            pos: 0,
            closed: false,
        }))
    }

    fn create(&self, path: &str) -> DatasetResult<Box<dyn Write + Send>> {
        let path = normalize(path).to_string();
        if self.is_read_only(&path) {
            return Err(DatasetError::new(
                ErrorKind::DestinationUnwritable,
                format!("{path} is read-only"),
            ));
        }
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .insert(path.clone(), Vec::new());
        Ok(Box::new(MemoryFileWriter {
            files: Arc::clone(&self.files),
            path,
        }))
    }
}

/// Appends straight into the shared map, so partially written files are visible.
struct MemoryFileWriter {
    files: FileStorage,
    path: String,
}

impl Write for MemoryFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| std::io::Error::other("storage mutex poisoned"))?;
        files.entry(self.path.clone()).or_default().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Reads from the snapshot taken at open time.
struct MemorySeekableHandle {
    data: Vec<u8>,
    pos: u64,
    closed: bool,
}

impl MemorySeekableHandle {
    fn check_open(&self) -> DatasetResult<()> {
        if self.closed {
            return Err(DatasetError::new(ErrorKind::Io, "Handle is closed"));
        }
        Ok(())
    }
}

impl SeekableHandle for MemorySeekableHandle {
    fn tell(&mut self) -> DatasetResult<u64> {
        self.check_open()?;
        Ok(self.pos)
    }

    fn seek(&mut self, pos: u64) -> DatasetResult<()> {
        self.check_open()?;
        self.pos = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> DatasetResult<usize> {
        self.check_open()?;
        let len = self.data.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = usize::try_from(self.pos).unwrap_or(usize::MAX);
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn close(&mut self) -> DatasetResult<()> {
        if !self.closed {
            self.closed = true;
            self.data = Vec::new();
        }
        Ok(())
    }
}
