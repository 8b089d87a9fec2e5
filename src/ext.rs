//! # Extension Traits
//!
//! Recursive and whole-file operations built only on the [`Backend`]
//! contract, so they behave the same on every backend.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`create_dir_all`](BackendExt::create_dir_all) | `mkdir -p` |
//! | [`create_parent_dirs`](BackendExt::create_parent_dirs) | `mkdir -p` of a file path's parent |
//! | [`file_exists`](BackendExt::file_exists) / [`dir_exists`](BackendExt::dir_exists) | Stat-based checks |
//! | [`entry_count`](BackendExt::entry_count) | Total entries for a mode |
//! | [`size_and_timestamps`](BackendExt::size_and_timestamps) | Size plus times |
//! | [`read_entire_file`](BackendExt::read_entire_file) | Whole-file read |
//! | [`write_entire_file`](BackendExt::write_entire_file) | Whole-file write |
//! | [`copy_entire_file`](BackendExt::copy_entire_file) | Read then write |

use crate::{Backend, CreateOptions, DirMode, FileType, FsError, FsPath, OpenMode, PolicyMode, Timestamps};

/// Extension methods for any backend.
///
/// # Example
///
/// ```rust
/// use fsmount::{Backend, BackendExt, FsError, FsPath, PolicyMode};
///
/// fn backup<B: Backend + ?Sized>(backend: &B, src: &FsPath, dst: &FsPath) -> Result<(), FsError> {
///     backend.create_parent_dirs(dst, PolicyMode::Enforce)?;
///     backend.copy_entire_file(src, dst, PolicyMode::Enforce)
/// }
/// ```
pub trait BackendExt: Backend {
    /// Create `path` and any missing ancestors.
    ///
    /// Idempotent: an existing directory, or an existing entry at any
    /// ancestor, is not an error. A path under a read-only root fails before
    /// anything is created. Fails fast on any other error and leaves
    /// already-created ancestors in place.
    fn create_dir_all(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy().check_create(path, mode, "create_dir_all")?;
        match self.create_dir(path, mode) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_already_exists() => return Ok(()),
            Err(e @ FsError::ReadOnly { .. }) => return Err(e),
            Err(_) => {}
        }

        let mut current = FsPath::new(path.anchor())?;
        for component in path.components() {
            current = current.append(component)?;
            match self.create_dir(&current, mode) {
                Ok(()) => {
                    tracing::debug!(target: "fsmount::ext", path = %current, "created ancestor");
                }
                Err(e) if e.is_already_exists() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Create the parent directories of the file path `path`.
    ///
    /// A no-op when `path` has no separator.
    fn create_parent_dirs(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        if !path.has_separator() {
            return Ok(());
        }
        let parent = path.parent();
        if parent.components().next().is_none() {
            return Ok(());
        }
        self.policy().check_create(&parent, mode, "create_parent_dirs")?;
        self.create_dir_all(&parent, mode)
    }

    /// Returns `true` if `path` is a file. Errors count as absent.
    fn file_exists(&self, path: &FsPath) -> bool {
        matches!(self.stat(path), Ok(FileType::File))
    }

    /// Returns `true` if `path` is a directory. Errors count as absent.
    fn dir_exists(&self, path: &FsPath) -> bool {
        matches!(self.stat(path), Ok(FileType::Directory))
    }

    /// Total entries of `path` matching `mode`.
    fn entry_count(&self, path: &FsPath, mode: DirMode) -> Result<u64, FsError> {
        let (files, dirs) = self.entry_counts(path, mode)?;
        Ok(files + dirs)
    }

    /// File size and timestamps in one call.
    fn size_and_timestamps(&self, path: &FsPath) -> Result<(u64, Timestamps), FsError> {
        let size = self.open_file(path, OpenMode::READ)?.size()?;
        Ok((size, self.stat_timestamps(path)?))
    }

    /// Read the whole file in a single call.
    ///
    /// The output holds what was actually read, which is shorter than the
    /// reported size only if the file shrank underneath the read.
    fn read_entire_file(&self, path: &FsPath) -> Result<Vec<u8>, FsError> {
        let mut file = self.open_file(path, OpenMode::READ)?;
        let size = file.size()?;
        let len = usize::try_from(size).map_err(|_| FsError::Io {
            operation: "read_entire_file",
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "file exceeds address space"),
        })?;
        let mut data = vec![0u8; len];
        let read = file.read(0, &mut data)?;
        data.truncate(read);
        file.close()?;
        Ok(data)
    }

    /// Replace the contents of `path` with `data`, creating it if needed.
    ///
    /// Checked against the safety policy as a destructive write. On a
    /// managed backend the final close commits.
    fn write_entire_file(&self, path: &FsPath, data: &[u8], mode: PolicyMode) -> Result<(), FsError> {
        self.policy().check_destroy(path, mode, "write_entire_file")?;
        match self.create_file(path, 0, CreateOptions::NONE, mode) {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e),
        }
        let mut file = self.open_file(path, OpenMode::WRITE)?;
        file.set_size(data.len() as u64)?;
        file.write(0, data)?;
        file.close()
    }

    /// Copy `src` to `dst` by whole-file read then write.
    ///
    /// `dst` is never touched when reading `src` fails.
    fn copy_entire_file(&self, src: &FsPath, dst: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy().check_destroy(dst, mode, "copy_entire_file")?;
        let data = self.read_entire_file(src)?;
        self.write_entire_file(dst, &data, mode)
    }
}

impl<B: Backend + ?Sized> BackendExt for B {}
