//! Local-disk filesystem backend.

use crate::io::fs::helpers::{join, parse_path_uri};
use crate::io::fs::traits::{
    DatasetError, DatasetResult, ErrorKind, FileEntry, FileSystem, SeekableHandle,
};
use log::debug;
use std::fs::{File, create_dir_all, read_dir};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Configuration for [`LocalFileSystem`].
///
/// Passed explicitly at construction; there is no process-wide default.
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Relative paths are resolved against this directory when set.
    pub root: Option<PathBuf>,
    /// Create missing parent directories in [`FileSystem::create`].
    pub create_parent_dirs: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            root: None,
            create_parent_dirs: true,
        }
    }
}

impl FsConfig {
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn without_parent_dirs(mut self) -> Self {
        self.create_parent_dirs = false;
        self
    }
}

/// [`FileSystem`] over `std::fs`. Accepts bare paths and `file://` URIs.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    config: FsConfig,
}

impl LocalFileSystem {
    #[must_use]
    pub fn new(config: FsConfig) -> Self {
        Self { config }
    }

    fn resolve(&self, path: &str) -> DatasetResult<PathBuf> {
        let local = match parse_path_uri(path)? {
            (None | Some("file"), rest) => PathBuf::from(rest),
            (Some(scheme), _) => {
                return Err(DatasetError::new(
                    ErrorKind::InvalidInput,
                    format!("Unsupported scheme '{scheme}' for local filesystem: {path}"),
                ));
            }
        };
        Ok(match &self.config.root {
            Some(root) if local.is_relative() => root.join(local),
            _ => local,
        })
    }
}

fn with_path(err: std::io::Error, path: &str) -> DatasetError {
    DatasetError::from(err).with_source(path)
}

impl FileSystem for LocalFileSystem {
    fn list(&self, dir: &str) -> DatasetResult<Vec<FileEntry>> {
        let local = self.resolve(dir)?;
        let mut entries = Vec::new();
        for entry in read_dir(&local).map_err(|e| with_path(e, dir))? {
            let entry = entry.map_err(|e| with_path(e, dir))?;
            let meta = entry.metadata().map_err(|e| with_path(e, dir))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = join(dir, &name);
            entries.push(if meta.is_dir() {
                FileEntry::dir(path)
            } else {
                FileEntry::file(path, meta.len())
            });
        }
        Ok(entries)
    }

    fn open(&self, path: &str) -> DatasetResult<Box<dyn Read + Send>> {
        let f = File::open(self.resolve(path)?).map_err(|e| with_path(e, path))?;
        Ok(Box::new(BufReader::new(f)))
    }

    fn content_length(&self, path: &str) -> DatasetResult<u64> {
        let meta = std::fs::metadata(self.resolve(path)?).map_err(|e| with_path(e, path))?;
        Ok(meta.len())
    }

    fn open_seekable(&self, path: &str) -> DatasetResult<Box<dyn SeekableHandle>> {
        let f = File::open(self.resolve(path)?).map_err(|e| with_path(e, path))?;
        Ok(Box::new(LocalSeekableHandle { file: Some(f) }))
    }

    fn create(&self, path: &str) -> DatasetResult<Box<dyn Write + Send>> {
        let local = self.resolve(path)?;
        if self.config.create_parent_dirs
            && let Some(parent) = local.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).map_err(|e| with_path(e, path))?;
        }
        debug!("create {}", local.display());
        let f = File::create(&local).map_err(|e| with_path(e, path))?;
        Ok(Box::new(BufWriter::new(f)))
    }
}

struct LocalSeekableHandle {
    file: Option<File>,
}

impl LocalSeekableHandle {
    fn file(&mut self) -> DatasetResult<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| DatasetError::new(ErrorKind::Io, "Handle is closed"))
    }
}

impl SeekableHandle for LocalSeekableHandle {
    fn tell(&mut self) -> DatasetResult<u64> {
        Ok(self.file()?.stream_position()?)
    }

    fn seek(&mut self, pos: u64) -> DatasetResult<()> {
        self.file()?.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> DatasetResult<usize> {
        Ok(self.file()?.read(buf)?)
    }

    fn close(&mut self) -> DatasetResult<()> {
        self.file.take();
        Ok(())
    }
}
