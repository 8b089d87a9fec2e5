//! File handles.
//!
//! A [`File`] is obtained from [`FsOpen::open_file`](crate::FsOpen::open_file)
//! and borrows the backend that opened it, so it cannot outlive the mount.
//! The backend-specific descriptor sits behind [`FileIo`]; the handle releases
//! it exactly once, either on [`File::close`] or on drop.

use crate::{FsError, FsPath, OpenMode};

/// Backend-specific file descriptor.
///
/// Implemented by each backend. [`File`] guarantees that `close` is called at
/// most once and that no other method is called afterwards.
pub trait FileIo: Send {
    /// Read up to `buf.len()` bytes at `offset`. A short count means end of
    /// file.
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Write all of `data` at `offset`. Writing fewer bytes is an error.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), FsError>;

    /// Truncate or extend the file to `size` bytes.
    fn set_size(&mut self, size: u64) -> Result<(), FsError>;

    /// Current size in bytes.
    fn size(&mut self) -> Result<u64, FsError>;

    /// Release the descriptor, committing first where the backend requires it.
    fn close(&mut self) -> Result<(), FsError>;
}

/// An open file bound to one backend and one [`OpenMode`].
///
/// Closing is idempotent: a second `close`, or closing a handle that never
/// opened ([`File::closed`]), is a no-op. Any other call on a closed handle
/// fails with [`FsError::NotActive`].
///
/// # Example
///
/// ```rust
/// use fsmount::{FsOpen, FsError, FsPath, OpenMode};
///
/// fn header<B: FsOpen>(backend: &B, path: &FsPath) -> Result<[u8; 4], FsError> {
///     let mut file = backend.open_file(path, OpenMode::READ)?;
///     let mut magic = [0u8; 4];
///     file.read(0, &mut magic)?;
///     file.close()?;
///     Ok(magic)
/// }
/// ```
pub struct File<'a> {
    io: Option<Box<dyn FileIo + 'a>>,
    path: FsPath,
    mode: OpenMode,
}

impl<'a> File<'a> {
    /// Wrap a backend descriptor. Called by backend implementations.
    pub fn new(path: FsPath, mode: OpenMode, io: impl FileIo + 'a) -> Self {
        Self {
            io: Some(Box::new(io)),
            path,
            mode,
        }
    }

    /// A handle that was never opened.
    pub fn closed() -> Self {
        Self {
            io: None,
            path: FsPath::default(),
            mode: OpenMode::default(),
        }
    }

    /// Returns `true` until the handle is closed.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.io.is_some()
    }

    /// The path this handle was opened with.
    pub fn path(&self) -> &FsPath {
        &self.path
    }

    /// The mode this handle was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn io(&mut self, operation: &'static str) -> Result<&mut (dyn FileIo + 'a), FsError> {
        self.io
            .as_deref_mut()
            .ok_or(FsError::NotActive { operation })
    }

    /// Read up to `buf.len()` bytes at `offset`, returning the count read.
    ///
    /// A short count only happens at end of file.
    pub fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.io("read")?.read(offset, buf)
    }

    /// Write all of `data` at `offset`.
    ///
    /// # Errors
    ///
    /// - [`FsError::PartialTransfer`] if the provider accepted fewer bytes
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), FsError> {
        self.io("write")?.write(offset, data)
    }

    /// Truncate or extend the file to `size` bytes.
    pub fn set_size(&mut self, size: u64) -> Result<(), FsError> {
        self.io("set_size")?.set_size(size)
    }

    /// Current size in bytes.
    pub fn size(&mut self) -> Result<u64, FsError> {
        self.io("size")?.size()
    }

    /// Close the handle. Write handles on a managed backend commit here.
    pub fn close(&mut self) -> Result<(), FsError> {
        match self.io.take() {
            Some(mut io) => io.close(),
            None => Ok(()),
        }
    }
}

impl Default for File<'_> {
    fn default() -> Self {
        Self::closed()
    }
}

impl Drop for File<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(target: "fsmount::file", path = %self.path, %error, "close on drop failed");
        }
    }
}

impl std::fmt::Debug for File<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
