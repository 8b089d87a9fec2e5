//! Directory handles.

use crate::{DirEntry, DirMode, FsError, FsPath};

/// Backend-specific directory descriptor.
pub trait DirIo: Send {
    /// Number of entries matching the handle's mode.
    ///
    /// Host enumeration rewinds the stream afterwards, so a following
    /// [`read`](DirIo::read) starts from the first entry again.
    fn entry_count(&mut self) -> Result<u64, FsError>;

    /// Append up to `max_entries` entries to `out`, returning how many were
    /// appended. Fewer than requested means the listing is exhausted.
    fn read(&mut self, out: &mut Vec<DirEntry>, max_entries: usize) -> Result<usize, FsError>;

    /// Read every remaining entry.
    fn read_all(&mut self) -> Result<Vec<DirEntry>, FsError> {
        let mut out = Vec::new();
        self.read(&mut out, usize::MAX)?;
        Ok(out)
    }

    /// Release the descriptor.
    fn close(&mut self) -> Result<(), FsError> {
        Ok(())
    }
}

/// An open directory bound to one backend and one [`DirMode`].
///
/// # Example
///
/// ```rust
/// use fsmount::{DirMode, FsError, FsOpen, FsPath};
///
/// fn subdirs<B: FsOpen>(backend: &B, path: &FsPath) -> Result<Vec<String>, FsError> {
///     let mut dir = backend.open_dir(path, DirMode::DIRS)?;
///     Ok(dir.read_all()?.into_iter().map(|e| e.name).collect())
/// }
/// ```
pub struct Dir<'a> {
    io: Option<Box<dyn DirIo + 'a>>,
    path: FsPath,
    mode: DirMode,
}

impl<'a> Dir<'a> {
    /// Wrap a backend descriptor. Called by backend implementations.
    pub fn new(path: FsPath, mode: DirMode, io: impl DirIo + 'a) -> Self {
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
            mode: DirMode::default(),
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

    /// The enumeration mode.
    pub fn mode(&self) -> DirMode {
        self.mode
    }

    fn io(&mut self, operation: &'static str) -> Result<&mut (dyn DirIo + 'a), FsError> {
        self.io
            .as_deref_mut()
            .ok_or(FsError::NotActive { operation })
    }

    /// Number of entries matching this handle's mode.
    pub fn entry_count(&mut self) -> Result<u64, FsError> {
        self.io("entry_count")?.entry_count()
    }

    /// Append up to `max_entries` entries to `out`; see [`DirIo::read`].
    pub fn read(&mut self, out: &mut Vec<DirEntry>, max_entries: usize) -> Result<usize, FsError> {
        self.io("read_dir")?.read(out, max_entries)
    }

    /// Materialize every remaining entry.
    pub fn read_all(&mut self) -> Result<Vec<DirEntry>, FsError> {
        self.io("read_all")?.read_all()
    }

    /// Close the handle. Idempotent.
    pub fn close(&mut self) -> Result<(), FsError> {
        match self.io.take() {
            Some(mut io) => io.close(),
            None => Ok(()),
        }
    }
}

impl Default for Dir<'_> {
    fn default() -> Self {
        Self::closed()
    }
}

impl Drop for Dir<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(target: "fsmount::dir", path = %self.path, %error, "close on drop failed");
        }
    }
}

impl std::fmt::Debug for Dir<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dir")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
