//! The managed storage service's call surface.

use std::fmt;

use crate::{CreateOptions, DirEntry, DirMode, FileType, FsPath, OpenMode, Timestamps};

/// Native result code of the managed service: a module number and a
/// description packed into one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(u32);

impl ResultCode {
    /// Module number of the filesystem service.
    pub const MODULE_FS: u32 = 2;

    /// Path does not exist, or exists with the wrong type.
    pub const PATH_NOT_FOUND: Self = Self::new(Self::MODULE_FS, 1);
    /// Path already exists.
    pub const PATH_ALREADY_EXISTS: Self = Self::new(Self::MODULE_FS, 2);
    /// Target is locked by an open handle.
    pub const TARGET_LOCKED: Self = Self::new(Self::MODULE_FS, 7);
    /// Directory still has entries.
    pub const DIRECTORY_NOT_EMPTY: Self = Self::new(Self::MODULE_FS, 8);
    /// Operation not implemented by this service.
    pub const NOT_IMPLEMENTED: Self = Self::new(Self::MODULE_FS, 3001);
    /// Size is out of range for the requested options.
    pub const OUT_OF_RANGE: Self = Self::new(Self::MODULE_FS, 3005);
    /// Handle was not opened with the access the operation needs.
    pub const INVALID_OPEN_MODE: Self = Self::new(Self::MODULE_FS, 6202);
    /// Operation is not supported on this target.
    pub const UNSUPPORTED_OPERATION: Self = Self::new(Self::MODULE_FS, 6300);

    /// Pack a module and description.
    pub const fn new(module: u32, description: u32) -> Self {
        Self((module & 0x1ff) | ((description & 0x1fff) << 9))
    }

    /// Wrap a raw code.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw code.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Module number.
    pub const fn module(&self) -> u32 {
        self.0 & 0x1ff
    }

    /// Description number.
    pub const fn description(&self) -> u32 {
        (self.0 >> 9) & 0x1fff
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:04}", 2000 + self.module(), self.description())
    }
}

/// The system-call surface of a transactional storage service.
///
/// Mutations are staged until [`commit`](StorageService::commit); a crash
/// before commit may roll them back. [`ManagedBackend`](super::ManagedBackend)
/// adapts any implementation to the [`Backend`](crate::Backend) contract.
pub trait StorageService: Send + Sync {
    /// Service file object. Dropping it releases the service handle.
    type File: ServiceFile;
    /// Service directory object. Dropping it releases the service handle.
    type Dir: ServiceDir;

    /// Create a file of `size` bytes.
    fn create_file(&self, path: &FsPath, size: u64, options: CreateOptions) -> Result<(), ResultCode>;
    /// Create one directory.
    fn create_dir(&self, path: &FsPath) -> Result<(), ResultCode>;
    /// Delete a file.
    fn delete_file(&self, path: &FsPath) -> Result<(), ResultCode>;
    /// Delete an empty directory.
    fn delete_dir(&self, path: &FsPath) -> Result<(), ResultCode>;
    /// Delete a directory tree.
    fn delete_dir_recursively(&self, path: &FsPath) -> Result<(), ResultCode>;
    /// Rename a file.
    fn rename_file(&self, from: &FsPath, to: &FsPath) -> Result<(), ResultCode>;
    /// Rename a directory.
    fn rename_dir(&self, from: &FsPath, to: &FsPath) -> Result<(), ResultCode>;
    /// Entry type at `path`.
    fn entry_type(&self, path: &FsPath) -> Result<FileType, ResultCode>;
    /// Raw timestamps of `path`.
    fn timestamps(&self, path: &FsPath) -> Result<Timestamps, ResultCode>;
    /// Open a file.
    fn open_file(&self, path: &FsPath, mode: OpenMode) -> Result<Self::File, ResultCode>;
    /// Open a directory.
    fn open_dir(&self, path: &FsPath, mode: DirMode) -> Result<Self::Dir, ResultCode>;
    /// Publish staged mutations.
    fn commit(&self) -> Result<(), ResultCode>;
}

/// An open service file.
pub trait ServiceFile: Send {
    /// Read at `offset`; short only at end of file.
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, ResultCode>;
    /// Write all of `data` at `offset`, extending the file if needed.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), ResultCode>;
    /// Resize the file.
    fn set_size(&mut self, size: u64) -> Result<(), ResultCode>;
    /// Current size.
    fn size(&mut self) -> Result<u64, ResultCode>;
}

/// An open service directory.
pub trait ServiceDir: Send {
    /// Total matching entries (native count primitive).
    fn entry_count(&mut self) -> Result<u64, ResultCode>;
    /// Up to `max_entries` further entries.
    fn read(&mut self, max_entries: usize) -> Result<Vec<DirEntry>, ResultCode>;
}
