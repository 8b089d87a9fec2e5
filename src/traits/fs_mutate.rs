//! Mutating operations.

use crate::{CreateOptions, FsError, FsPath, PolicyMode, SafetyPolicy};

/// Create, delete and rename operations, guarded by the backend's
/// [`SafetyPolicy`].
///
/// Every method taking a [`PolicyMode`] checks the policy first unless the
/// caller passes [`PolicyMode::Ignore`]; a protected path fails with
/// [`FsError::ReadOnly`] before any provider call is made. Creation consults
/// only the read-only roots; deletion and rename consult both sets, and
/// rename checks source and destination.
///
/// On a managed backend every successful mutation is committed before the
/// call returns.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsMutate`.
pub trait FsMutate: Send + Sync {
    /// The policy this backend was mounted with.
    fn policy(&self) -> &SafetyPolicy;

    /// Create a file of `size` bytes (zero-filled).
    ///
    /// Sizes of 4 GiB and up get [`CreateOptions::BIG_FILE`] on backends that
    /// need it.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if the path exists
    /// - [`FsError::ReadOnly`] if the path is under a read-only root
    fn create_file(
        &self,
        path: &FsPath,
        size: u64,
        options: CreateOptions,
        mode: PolicyMode,
    ) -> Result<(), FsError>;

    /// Create a single directory level.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if the path exists
    /// - [`FsError::NotFound`] if the parent does not exist
    fn create_dir(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError>;

    /// Delete a file.
    fn delete_file(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError>;

    /// Delete an empty directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::DirectoryNotEmpty`] if the directory has entries
    fn delete_dir(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError>;

    /// Delete a directory and everything below it.
    ///
    /// Symbolic links are removed, never followed. Fails fast on the first
    /// error, leaving whatever was already removed removed.
    fn delete_dir_all(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError>;

    /// Rename a file.
    fn rename_file(&self, from: &FsPath, to: &FsPath, mode: PolicyMode) -> Result<(), FsError>;

    /// Rename a directory.
    fn rename_dir(&self, from: &FsPath, to: &FsPath, mode: PolicyMode) -> Result<(), FsError>;

    /// Flush pending mutation state. A no-op on backends without a commit
    /// step.
    fn commit(&self) -> Result<(), FsError>;
}
