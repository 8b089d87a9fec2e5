//! Metadata queries.

use crate::{FileType, FsError, FsPath, Timestamps};

/// Entry type and timestamp queries.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsQuery`.
pub trait FsQuery: Send + Sync {
    /// Type of the entry at `path`.
    ///
    /// Symbolic links are followed; entries that are neither file nor
    /// directory report [`FileType::File`].
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing exists at `path`
    fn stat(&self, path: &FsPath) -> Result<FileType, FsError>;

    /// Creation, modification and access times of `path`.
    fn stat_timestamps(&self, path: &FsPath) -> Result<Timestamps, FsError>;

    /// Set access and modification times.
    ///
    /// Ignored when `timestamps.is_valid` is `false`. Backends that cannot
    /// write timestamps treat this as a successful no-op.
    fn set_timestamps(&self, path: &FsPath, timestamps: &Timestamps) -> Result<(), FsError>;
}
