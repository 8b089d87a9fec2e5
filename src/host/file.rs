use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::{FileIo, FsError, FsPath};

/// Host file descriptor with a tracked cursor.
///
/// Sequential access dominates, so a seek is issued only when the requested
/// offset differs from where the previous call left the cursor.
pub(super) struct HostFile {
    file: fs::File,
    path: FsPath,
    cursor: Option<u64>,
}

impl HostFile {
    pub(super) fn new(file: fs::File, path: FsPath) -> Self {
        Self {
            file,
            path,
            cursor: Some(0),
        }
    }

    fn fault(&mut self, operation: &'static str, error: io::Error) -> FsError {
        // Position is unknown after a failed transfer.
        self.cursor = None;
        FsError::io(operation, self.path.as_str(), error)
    }

    fn seek_to(&mut self, offset: u64, operation: &'static str) -> Result<(), FsError> {
        if self.cursor == Some(offset) {
            return Ok(());
        }
        tracing::debug!(target: "fsmount::host", path = %self.path, offset, "seek");
        match self.file.seek(SeekFrom::Start(offset)) {
            Ok(_) => {
                self.cursor = Some(offset);
                Ok(())
            }
            Err(e) => Err(self.fault(operation, e)),
        }
    }
}

impl FileIo for HostFile {
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.seek_to(offset, "read")?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.fault("read", e)),
            }
        }
        self.cursor = Some(offset + filled as u64);
        Ok(filled)
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), FsError> {
        self.seek_to(offset, "write")?;
        let mut written = 0;
        while written < data.len() {
            match self.file.write(&data[written..]) {
                Ok(0) => {
                    self.cursor = None;
                    return Err(FsError::PartialTransfer {
                        path: self.path.to_string(),
                        requested: data.len(),
                        written,
                    });
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.fault("write", e)),
            }
        }
        self.cursor = Some(offset + written as u64);
        Ok(())
    }

    fn set_size(&mut self, size: u64) -> Result<(), FsError> {
        self.file
            .set_len(size)
            .map_err(|e| FsError::io("set_size", self.path.as_str(), e))
    }

    fn size(&mut self) -> Result<u64, FsError> {
        self.file
            .metadata()
            .map(|meta| meta.len())
            .map_err(|e| FsError::io("size", self.path.as_str(), e))
    }

    // Dropping the descriptor closes it.
    fn close(&mut self) -> Result<(), FsError> {
        Ok(())
    }
}
