//! Handle-producing operations.

use crate::{Dir, DirMode, File, FsError, FsPath, OpenMode};

/// Operations that open handles, plus directory queries built on them.
///
/// Handles borrow the backend, so they cannot outlive it.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsOpen`.
pub trait FsOpen: Send + Sync {
    /// Open a file. Opening never creates or truncates.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    fn open_file(&self, path: &FsPath, mode: OpenMode) -> Result<File<'_>, FsError>;

    /// Open a directory for enumeration.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    fn open_dir(&self, path: &FsPath, mode: DirMode) -> Result<Dir<'_>, FsError>;

    /// Count the entries of `path` as `(files, dirs)`, restricted to `mode`.
    fn entry_counts(&self, path: &FsPath, mode: DirMode) -> Result<(u64, u64), FsError> {
        let mut dir = self.open_dir(path, mode)?;
        let entries = dir.read_all()?;
        let dirs = entries.iter().filter(|e| e.is_dir()).count() as u64;
        Ok((entries.len() as u64 - dirs, dirs))
    }

    /// Returns `true` if `path` has no entries.
    fn is_dir_empty(&self, path: &FsPath) -> Result<bool, FsError> {
        let mut dir = self.open_dir(path, DirMode::ALL)?;
        let mut first = Vec::with_capacity(1);
        Ok(dir.read(&mut first, 1)? == 0)
    }
}
