//! Byte-range contracts for transfer drivers and digest computation.
//!
//! A chunked-transfer driver pulls from a [`ReadSource`] and pushes into a
//! [`WriteSink`] one range at a time; it may stop between any two calls.
//! [`File`] implements both, [`MemSource`] serves an in-memory buffer.

use crate::{File, FsError};

/// A sized source of bytes read by offset.
pub trait ReadSource {
    /// Total size in bytes.
    fn size(&mut self) -> Result<u64, FsError>;

    /// Read up to `buf.len()` bytes at `offset`. Short reads happen only at
    /// end of stream.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError>;
}

/// A destination written by offset.
pub trait WriteSink {
    /// Write `data` at `offset`, returning the committed byte count, which
    /// equals `data.len()` on success.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<usize, FsError>;
}

impl ReadSource for File<'_> {
    fn size(&mut self) -> Result<u64, FsError> {
        File::size(self)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.read(offset, buf)
    }
}

impl WriteSink for File<'_> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<usize, FsError> {
        self.write(offset, data)?;
        Ok(data.len())
    }
}

/// A [`ReadSource`] over a borrowed byte slice.
///
/// Reads at or past the end return zero bytes.
#[derive(Debug, Clone, Copy)]
pub struct MemSource<'a> {
    data: &'a [u8],
}

impl<'a> MemSource<'a> {
    /// Wrap `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ReadSource for MemSource<'_> {
    fn size(&mut self) -> Result<u64, FsError> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        let Some(avail) = self.data.get(start..) else {
            return Ok(0);
        };
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_source_reads_ranges() {
        let mut src = MemSource::new(b"hello world");
        assert_eq!(src.size().unwrap(), 11);

        let mut buf = [0u8; 5];
        assert_eq!(src.read_at(6, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn mem_source_short_read_at_end() {
        let mut src = MemSource::new(b"abc");
        let mut buf = [0u8; 8];
        assert_eq!(src.read_at(1, &mut buf).unwrap(), 2);
        assert_eq!(src.read_at(3, &mut buf).unwrap(), 0);
        assert_eq!(src.read_at(u64::MAX, &mut buf).unwrap(), 0);
    }

    #[test]
    fn closed_file_is_not_a_live_source() {
        let mut file = File::closed();
        assert!(matches!(
            ReadSource::size(&mut file),
            Err(FsError::NotActive { .. })
        ));
        assert!(matches!(
            file.write_at(0, b"x"),
            Err(FsError::NotActive { .. })
        ));
    }
}
