//! Backing media for the byte heap
//!
//! A medium is a flat, random-access byte store. The heap keeps the medium's
//! length equal to its own address space and performs all reads and writes
//! through the [`Medium`] capability, so the same heap code runs over an
//! in-memory buffer or a file.

use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Random-access byte store capability.
///
/// Short reads are permitted; short writes are not. Extending the length
/// appends bytes whose contents are unobservable until written. Media are
/// `Send` so a heap can sit behind the shared-dictionary lock.
pub trait Medium: Send {
    /// Move the cursor to an absolute byte offset.
    fn set_position(&mut self, pos: u64) -> Result<()>;

    /// Read from the cursor into `buf`, returning the number of bytes read.
    /// Returns 0 at end of medium.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf` at the cursor.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Grow or truncate the medium to `len` bytes.
    fn set_length(&mut self, len: u64) -> Result<()>;

    /// Current length in bytes.
    fn length(&self) -> Result<u64>;

    /// Release the medium. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "medium is closed")
}

/// Growable in-memory medium backed by a byte vector.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    buf: Vec<u8>,
    pos: u64,
}

impl MemoryMedium {
    pub fn new() -> Self {
        MemoryMedium::default()
    }
}

impl Medium for MemoryMedium {
    fn set_position(&mut self, pos: u64) -> Result<()> {
        self.pos = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self.buf.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let available = (len - self.pos) as usize;
        let n = buf.len().min(available);
        let start = self.pos as usize;
        buf[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let end = self.pos as usize + buf.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        let start = self.pos as usize;
        self.buf[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(())
    }

    fn set_length(&mut self, len: u64) -> Result<()> {
        self.buf.resize(len as usize, 0);
        Ok(())
    }

    fn length(&self) -> Result<u64> {
        Ok(self.buf.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        self.buf = Vec::new();
        Ok(())
    }
}

enum Backing {
    /// Caller-named file; left in place on close.
    Plain(File),
    /// Factory-created temp file; deleted on close.
    Temp(NamedTempFile),
}

impl Backing {
    fn file(&self) -> &File {
        match self {
            Backing::Plain(file) => file,
            Backing::Temp(temp) => temp.as_file(),
        }
    }

    fn file_mut(&mut self) -> &mut File {
        match self {
            Backing::Plain(file) => file,
            Backing::Temp(temp) => temp.as_file_mut(),
        }
    }
}

/// File-backed medium.
///
/// [`FileMedium::temp`] is the factory variant: it creates its own backing
/// file and deletes it on close. [`FileMedium::create`] and
/// [`FileMedium::open`] operate on a caller-supplied path and leave the file
/// behind.
pub struct FileMedium {
    backing: Option<Backing>,
}

impl FileMedium {
    /// Create (or truncate) a file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(FileMedium {
            backing: Some(Backing::Plain(file)),
        })
    }

    /// Open an existing file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(FileMedium {
            backing: Some(Backing::Plain(file)),
        })
    }

    /// Create a scratch medium over a fresh temporary file. The file is
    /// removed when the medium is closed or dropped.
    pub fn temp() -> Result<Self> {
        let temp = NamedTempFile::new()?;
        Ok(FileMedium {
            backing: Some(Backing::Temp(temp)),
        })
    }

    fn backing_mut(&mut self) -> Result<&mut Backing> {
        self.backing.as_mut().ok_or_else(|| closed().into())
    }
}

impl Medium for FileMedium {
    fn set_position(&mut self, pos: u64) -> Result<()> {
        self.backing_mut()?.file_mut().seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.backing_mut()?.file_mut().read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.backing_mut()?.file_mut().write_all(buf)?;
        Ok(())
    }

    fn set_length(&mut self, len: u64) -> Result<()> {
        self.backing_mut()?.file_mut().set_len(len)?;
        Ok(())
    }

    fn length(&self) -> Result<u64> {
        match &self.backing {
            Some(backing) => Ok(backing.file().metadata()?.len()),
            None => Err(closed().into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self.backing.take() {
            Some(Backing::Temp(temp)) => {
                temp.close().map_err(crate::error::StratumError::Io)
            }
            Some(Backing::Plain(_)) | None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(medium: &mut dyn Medium) {
        medium.set_length(16).unwrap();
        assert_eq!(medium.length().unwrap(), 16);

        medium.set_position(4).unwrap();
        medium.write(b"hello").unwrap();

        medium.set_position(4).unwrap();
        let mut buf = [0u8; 5];
        let n = medium.read(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut medium = MemoryMedium::new();
        roundtrip(&mut medium);
    }

    #[test]
    fn test_memory_read_at_end() {
        let mut medium = MemoryMedium::new();
        medium.set_length(4).unwrap();
        medium.set_position(4).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(medium.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_memory_short_read() {
        let mut medium = MemoryMedium::new();
        medium.set_length(4).unwrap();
        medium.set_position(2).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(medium.read(&mut buf).unwrap(), 2);
    }

    #[test]
    fn test_file_roundtrip() {
        let mut medium = FileMedium::temp().unwrap();
        roundtrip(&mut medium);
        medium.close().unwrap();
    }

    #[test]
    fn test_temp_file_removed_on_close() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_path_buf();
        drop(temp);

        let mut medium = FileMedium::create(&path).unwrap();
        medium.set_length(8).unwrap();
        medium.close().unwrap();

        // Caller-named files survive close
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();

        let mut medium = FileMedium::temp().unwrap();
        medium.set_length(8).unwrap();
        medium.close().unwrap();
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut medium = FileMedium::temp().unwrap();
        medium.close().unwrap();
        medium.close().unwrap();
    }

    #[test]
    fn test_operations_after_close_fail() {
        let mut medium = FileMedium::temp().unwrap();
        medium.close().unwrap();
        assert!(medium.set_position(0).is_err());
        assert!(medium.length().is_err());
    }

    #[test]
    fn test_set_length_extends_with_zeroes() {
        let mut medium = MemoryMedium::new();
        medium.write(b"abc").unwrap();
        medium.set_length(6).unwrap();

        medium.set_position(0).unwrap();
        let mut buf = [0xffu8; 6];
        assert_eq!(medium.read(&mut buf).unwrap(), 6);
        assert_eq!(&buf, b"abc\0\0\0");
    }
}
