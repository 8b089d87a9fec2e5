//! Backend over the host filesystem.
//!
//! Paths are used verbatim as host paths. There is no commit step, so
//! [`FsMutate::commit`] is a no-op.

mod dir;
mod file;

use std::fs;
use std::io;
use std::path::Path;

use crate::{
    CreateOptions, Dir, DirMode, File, FileType, FsError, FsMutate, FsOpen, FsPath, FsQuery,
    OpenMode, PolicyMode, SafetyPolicy, Timestamps,
};

use dir::{HostDir, Probe, classify};
use file::HostFile;

/// A mounted host directory tree.
///
/// # Example
///
/// ```rust
/// use fsmount::{BackendExt, FsPath, HostBackend, PolicyMode, SafetyPolicy};
///
/// let tmp = tempfile::tempdir()?;
/// let backend = HostBackend::new(SafetyPolicy::default());
/// let path = FsPath::new(tmp.path().join("logs/today.txt").to_string_lossy())?;
/// backend.create_parent_dirs(&path, PolicyMode::Enforce)?;
/// backend.write_entire_file(&path, b"ok", PolicyMode::Enforce)?;
/// assert!(backend.file_exists(&path));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct HostBackend {
    policy: SafetyPolicy,
}

impl HostBackend {
    /// Mount the host filesystem under `policy`.
    pub fn new(policy: SafetyPolicy) -> Self {
        Self { policy }
    }
}

fn host(path: &FsPath) -> &Path {
    Path::new(path.as_str())
}

/// Unlink `path`, descending into directories. Links are leaves.
fn remove_tree(path: &Path) -> Result<(), FsError> {
    let fault = |operation, error| FsError::io(operation, path.display().to_string(), error);

    let meta = fs::symlink_metadata(path).map_err(|e| fault("delete_dir_all", e))?;
    if !meta.is_dir() {
        return fs::remove_file(path).map_err(|e| fault("delete_file", e));
    }
    for entry in fs::read_dir(path).map_err(|e| fault("read_dir", e))? {
        let entry = entry.map_err(|e| fault("read_dir", e))?;
        let child = entry.path();
        match classify(&entry, Probe::NoFollow) {
            FileType::Directory => remove_tree(&child)?,
            FileType::File => fs::remove_file(&child)
                .map_err(|e| FsError::io("delete_file", child.display().to_string(), e))?,
        }
    }
    fs::remove_dir(path).map_err(|e| fault("delete_dir", e))
}

impl FsMutate for HostBackend {
    fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    // Host stores need no large-file hint.
    fn create_file(
        &self,
        path: &FsPath,
        size: u64,
        _options: CreateOptions,
        mode: PolicyMode,
    ) -> Result<(), FsError> {
        self.policy.check_create(path, mode, "create_file")?;
        let fault = |e| FsError::io("create_file", path.as_str(), e);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(host(path))
            .map_err(fault)?;
        if size > 0 {
            file.set_len(size).map_err(fault)?;
        }
        tracing::debug!(target: "fsmount::host", %path, size, "created file");
        Ok(())
    }

    fn create_dir(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_create(path, mode, "create_dir")?;
        fs::create_dir(host(path)).map_err(|e| FsError::io("create_dir", path.as_str(), e))?;
        tracing::debug!(target: "fsmount::host", %path, "created dir");
        Ok(())
    }

    fn delete_file(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(path, mode, "delete_file")?;
        fs::remove_file(host(path)).map_err(|e| FsError::io("delete_file", path.as_str(), e))?;
        tracing::debug!(target: "fsmount::host", %path, "deleted file");
        Ok(())
    }

    fn delete_dir(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(path, mode, "delete_dir")?;
        fs::remove_dir(host(path)).map_err(|e| FsError::io("delete_dir", path.as_str(), e))?;
        tracing::debug!(target: "fsmount::host", %path, "deleted dir");
        Ok(())
    }

    fn delete_dir_all(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(path, mode, "delete_dir_all")?;
        remove_tree(host(path))?;
        tracing::debug!(target: "fsmount::host", %path, "deleted tree");
        Ok(())
    }

    fn rename_file(&self, from: &FsPath, to: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(from, mode, "rename_file")?;
        self.policy.check_destroy(to, mode, "rename_file")?;
        fs::rename(host(from), host(to)).map_err(|e| FsError::io("rename_file", from.as_str(), e))?;
        tracing::debug!(target: "fsmount::host", %from, %to, "renamed");
        Ok(())
    }

    // Same primitive as files.
    fn rename_dir(&self, from: &FsPath, to: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(from, mode, "rename_dir")?;
        self.policy.check_destroy(to, mode, "rename_dir")?;
        fs::rename(host(from), host(to)).map_err(|e| FsError::io("rename_dir", from.as_str(), e))?;
        tracing::debug!(target: "fsmount::host", %from, %to, "renamed");
        Ok(())
    }

    fn commit(&self) -> Result<(), FsError> {
        Ok(())
    }
}

impl FsQuery for HostBackend {
    fn stat(&self, path: &FsPath) -> Result<FileType, FsError> {
        let meta = fs::metadata(host(path)).map_err(|e| FsError::io("stat", path.as_str(), e))?;
        Ok(if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        })
    }

    fn stat_timestamps(&self, path: &FsPath) -> Result<Timestamps, FsError> {
        let fault = |e| FsError::io("stat_timestamps", path.as_str(), e);
        let meta = fs::metadata(host(path)).map_err(fault)?;
        let modified = meta.modified().map_err(fault)?;
        Ok(Timestamps {
            created: meta.created().unwrap_or(modified),
            modified,
            accessed: meta.accessed().unwrap_or(modified),
            is_valid: true,
        })
    }

    fn set_timestamps(&self, path: &FsPath, timestamps: &Timestamps) -> Result<(), FsError> {
        if !timestamps.is_valid {
            return Ok(());
        }
        let times = fs::FileTimes::new()
            .set_accessed(timestamps.accessed)
            .set_modified(timestamps.modified);
        if let Err(error) = fs::File::open(host(path)).and_then(|file| file.set_times(times)) {
            tracing::warn!(target: "fsmount::host", %path, %error, "failed to set timestamps");
        }
        Ok(())
    }
}

impl FsOpen for HostBackend {
    /// Write-only opens as read-write: the host has no non-truncating
    /// write-only mode.
    fn open_file(&self, path: &FsPath, mode: OpenMode) -> Result<File<'_>, FsError> {
        let mut options = fs::OpenOptions::new();
        match (mode.read, mode.write) {
            (true, false) => {
                options.read(true);
            }
            (_, true) => {
                options.read(true).write(true);
            }
            (false, false) => {
                return Err(FsError::Io {
                    operation: "open_file",
                    path: path.to_string(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "empty open mode"),
                });
            }
        }
        let file = options
            .open(host(path))
            .map_err(|e| FsError::io("open_file", path.as_str(), e))?;
        Ok(File::new(path.clone(), mode, HostFile::new(file, path.clone())))
    }

    fn open_dir(&self, path: &FsPath, mode: DirMode) -> Result<Dir<'_>, FsError> {
        let io = HostDir::open(path.clone(), mode)?;
        Ok(Dir::new(path.clone(), mode, io))
    }

    /// Stops at the first entry.
    fn is_dir_empty(&self, path: &FsPath) -> Result<bool, FsError> {
        let mut entries =
            fs::read_dir(host(path)).map_err(|e| FsError::io("read_dir", path.as_str(), e))?;
        Ok(entries.next().is_none())
    }
}
