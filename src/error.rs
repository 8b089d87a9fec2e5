//! Error types for the storage layer.

use crate::ResultCode;

/// Storage error type with contextual variants.
///
/// Callers map these kinds to messages; provider-specific numeric codes are
/// only reachable through [`FsError::Service`] and should not be matched on.
///
/// # Examples
///
/// ```rust
/// use fsmount::FsError;
///
/// let err = FsError::ReadOnly { path: "/backup/a".into(), operation: "delete_file" };
/// assert_eq!(err.to_string(), "delete_file: read-only path: /backup/a");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Operation blocked by the safety policy.
    #[error("{operation}: read-only path: {path}")]
    ReadOnly {
        /// The protected path.
        path: String,
        /// The operation that was blocked.
        operation: &'static str,
    },

    /// Path already exists. Create operations commonly treat this as success.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Directory is not empty when it should be.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty {
        /// The non-empty directory.
        path: String,
    },

    /// Handle was never opened or is already closed.
    #[error("{operation}: handle not active")]
    NotActive {
        /// The operation attempted on the handle.
        operation: &'static str,
    },

    /// Path exceeds the provider's path capacity.
    #[error("path too long: {len} > {limit} bytes")]
    PathTooLong {
        /// Length of the rejected path in bytes.
        len: usize,
        /// Maximum accepted length.
        limit: usize,
    },

    /// A write moved fewer bytes than requested.
    #[error("partial write: {path} ({written} of {requested} bytes)")]
    PartialTransfer {
        /// The file being written.
        path: String,
        /// Bytes the caller asked to write.
        requested: usize,
        /// Bytes the provider accepted.
        written: usize,
    },

    /// Host store I/O failure.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Managed service failure.
    #[error("{operation} failed for {path}: service error {code}")]
    Service {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: String,
        /// The service's native result code.
        code: ResultCode,
    },
}

impl FsError {
    /// Returns `true` for [`FsError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, FsError::AlreadyExists { .. })
    }

    /// Returns `true` for [`FsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    /// Build an error from a host I/O failure, keeping the distinguished
    /// outcomes distinguished.
    pub(crate) fn io(operation: &'static str, path: impl Into<String>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound { path },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists { path, operation },
            std::io::ErrorKind::DirectoryNotEmpty => FsError::DirectoryNotEmpty { path },
            _ => FsError::Io {
                operation,
                path,
                source: error,
            },
        }
    }

    /// Build an error from a managed service result code.
    pub(crate) fn service(operation: &'static str, path: impl Into<String>, code: ResultCode) -> Self {
        let path = path.into();
        match code {
            ResultCode::PATH_NOT_FOUND => FsError::NotFound { path },
            ResultCode::PATH_ALREADY_EXISTS => FsError::AlreadyExists { path, operation },
            ResultCode::DIRECTORY_NOT_EMPTY => FsError::DirectoryNotEmpty { path },
            code => FsError::Service {
                operation,
                path,
                code,
            },
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::io("io", String::new(), error)
    }
}
