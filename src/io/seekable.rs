//! Random-access reads for block-structured container files.
//!
//! [`SeekableInput`] wraps the backend's seekable handle with the four operations a
//! container parser needs: `tell`, `seek`, `read`, and `length`. No decompression is
//! interposed; the container compresses its own blocks and addresses them by raw offset.

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind, FileSystem, SeekableHandle};
use log::debug;
use std::io::{self, Read, Seek, SeekFrom};

pub struct SeekableInput {
    path: String,
    handle: Box<dyn SeekableHandle>,
    length: u64,
    closed: bool,
}

impl SeekableInput {
    /// Open `path` for random access.
    ///
    /// The length is taken from [`FileSystem::content_length`] once, here. Bytes appended
    /// after opening are not visible.
    ///
    /// # Errors
    ///
    /// Surfaces the backend's failure if the file cannot be sized or opened.
    pub fn open(fs: &dyn FileSystem, path: &str) -> DatasetResult<Self> {
        let length = fs.content_length(path)?;
        let handle = fs.open_seekable(path)?;
        debug!("open seekable {path} ({length} bytes)");
        Ok(Self {
            path: path.to_string(),
            handle,
            length,
            closed: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Content length at open time.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Current position.
    ///
    /// # Errors
    ///
    /// Fails if the input is closed or the backend cannot report its position.
    pub fn tell(&mut self) -> DatasetResult<u64> {
        self.check_open()?;
        self.handle.tell()
    }

    /// Move to `pos`. Seeking past [`length`](Self::length) is allowed; later reads
    /// return 0.
    ///
    /// # Errors
    ///
    /// Fails if the input is closed or the backend rejects the seek.
    pub fn seek(&mut self, pos: u64) -> DatasetResult<()> {
        self.check_open()?;
        self.handle.seek(pos)
    }

    /// Read up to `max_len` bytes into `buf[offset..]`.
    ///
    /// Returns the number of bytes read; fewer than requested only at end of file, and 0
    /// once the position is at or past the length snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the input is closed, `offset` is outside `buf`, or the backend read fails.
    pub fn read(&mut self, buf: &mut [u8], offset: usize, max_len: usize) -> DatasetResult<usize> {
        self.check_open()?;
        if offset > buf.len() {
            return Err(DatasetError::new(
                ErrorKind::InvalidInput,
                format!("offset {offset} outside buffer of {} bytes", buf.len()),
            ));
        }
        let pos = self.handle.tell()?;
        if pos >= self.length {
            return Ok(0);
        }
        let remaining = usize::try_from(self.length - pos).unwrap_or(usize::MAX);
        let want = max_len.min(buf.len() - offset).min(remaining);
        let target = &mut buf[offset..offset + want];

        let mut filled = 0;
        while filled < want {
            let n = self.handle.read(&mut target[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Release the backend handle. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Surfaces the backend's failure on the first call.
    pub fn close(&mut self) -> DatasetResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("close seekable {}", self.path);
        self.handle.close()
    }

    fn check_open(&self) -> DatasetResult<()> {
        if self.closed {
            return Err(DatasetError::new(ErrorKind::Io, "Input is closed").with_source(&self.path));
        }
        Ok(())
    }
}

impl Drop for SeekableInput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn to_io(err: DatasetError) -> io::Error {
    match err.kind {
        ErrorKind::PathNotFound => io::Error::new(io::ErrorKind::NotFound, err),
        ErrorKind::InvalidInput => io::Error::new(io::ErrorKind::InvalidInput, err),
        _ => io::Error::other(err),
    }
}

impl Read for SeekableInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        SeekableInput::read(self, buf, 0, len).map_err(to_io)
    }
}

impl Seek for SeekableInput {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.tell().map_err(to_io)?.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of file")
        })?;
        SeekableInput::seek(self, target).map_err(to_io)?;
        Ok(target)
    }
}
