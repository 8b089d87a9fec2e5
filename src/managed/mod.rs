//! Backend over a transactional storage service.
//!
//! [`ManagedBackend`] adapts any [`StorageService`] to the [`Backend`]
//! contract. Every successful mutation is followed by a commit, and write
//! handles commit when they close, so callers never need to call
//! [`FsMutate::commit`] for correctness.
//!
//! [`Backend`]: crate::Backend

mod memory;
mod service;

pub use memory::{MemoryDir, MemoryFile, MemoryService};
pub use service::{ResultCode, ServiceDir, ServiceFile, StorageService};

use crate::{
    CreateOptions, Dir, DirEntry, DirIo, DirMode, File, FileIo, FileType, FsError, FsMutate,
    FsOpen, FsPath, FsQuery, OpenMode, PolicyMode, SafetyPolicy, Timestamps,
};

/// A mounted managed storage service.
///
/// # Example
///
/// ```rust
/// use fsmount::{BackendExt, FsPath, ManagedBackend, MemoryService, PolicyMode, SafetyPolicy};
///
/// let backend = ManagedBackend::new(MemoryService::new(), SafetyPolicy::default());
/// let path = FsPath::new("/config/app/settings.ini")?;
/// backend.create_parent_dirs(&path, PolicyMode::Enforce)?;
/// backend.write_entire_file(&path, b"[app]\n", PolicyMode::Enforce)?;
/// assert_eq!(backend.read_entire_file(&path)?, b"[app]\n");
/// # Ok::<(), fsmount::FsError>(())
/// ```
#[derive(Debug)]
pub struct ManagedBackend<S> {
    service: S,
    policy: SafetyPolicy,
}

impl<S: StorageService> ManagedBackend<S> {
    /// Mount `service` under `policy`.
    pub fn new(service: S, policy: SafetyPolicy) -> Self {
        Self { service, policy }
    }

    /// The underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    fn committed(
        &self,
        operation: &'static str,
        path: &FsPath,
        result: Result<(), ResultCode>,
    ) -> Result<(), FsError> {
        result.map_err(|code| FsError::service(operation, path.as_str(), code))?;
        tracing::debug!(target: "fsmount::managed", operation, %path, "committing");
        self.commit()
    }

    fn native_count(&self, path: &FsPath, mode: DirMode) -> Result<u64, FsError> {
        let mut dir = self
            .service
            .open_dir(path, mode)
            .map_err(|code| FsError::service("open_dir", path.as_str(), code))?;
        dir.entry_count()
            .map_err(|code| FsError::service("entry_count", path.as_str(), code))
    }
}

impl<S: StorageService> FsMutate for ManagedBackend<S> {
    fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    fn create_file(
        &self,
        path: &FsPath,
        size: u64,
        options: CreateOptions,
        mode: PolicyMode,
    ) -> Result<(), FsError> {
        self.policy.check_create(path, mode, "create_file")?;
        let options = options.for_size(size);
        self.committed(
            "create_file",
            path,
            self.service.create_file(path, size, options),
        )
    }

    fn create_dir(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_create(path, mode, "create_dir")?;
        self.committed("create_dir", path, self.service.create_dir(path))
    }

    fn delete_file(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(path, mode, "delete_file")?;
        self.committed("delete_file", path, self.service.delete_file(path))
    }

    fn delete_dir(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(path, mode, "delete_dir")?;
        self.committed("delete_dir", path, self.service.delete_dir(path))
    }

    fn delete_dir_all(&self, path: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(path, mode, "delete_dir_all")?;
        self.committed(
            "delete_dir_all",
            path,
            self.service.delete_dir_recursively(path),
        )
    }

    fn rename_file(&self, from: &FsPath, to: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(from, mode, "rename_file")?;
        self.policy.check_destroy(to, mode, "rename_file")?;
        self.committed("rename_file", from, self.service.rename_file(from, to))
    }

    fn rename_dir(&self, from: &FsPath, to: &FsPath, mode: PolicyMode) -> Result<(), FsError> {
        self.policy.check_destroy(from, mode, "rename_dir")?;
        self.policy.check_destroy(to, mode, "rename_dir")?;
        self.committed("rename_dir", from, self.service.rename_dir(from, to))
    }

    fn commit(&self) -> Result<(), FsError> {
        self.service
            .commit()
            .map_err(|code| FsError::service("commit", "", code))
    }
}

impl<S: StorageService> FsQuery for ManagedBackend<S> {
    fn stat(&self, path: &FsPath) -> Result<FileType, FsError> {
        self.service
            .entry_type(path)
            .map_err(|code| FsError::service("stat", path.as_str(), code))
    }

    fn stat_timestamps(&self, path: &FsPath) -> Result<Timestamps, FsError> {
        self.service
            .timestamps(path)
            .map_err(|code| FsError::service("stat_timestamps", path.as_str(), code))
    }

    // The service has no timestamp-write primitive.
    fn set_timestamps(&self, _path: &FsPath, _timestamps: &Timestamps) -> Result<(), FsError> {
        Ok(())
    }
}

impl<S: StorageService> FsOpen for ManagedBackend<S> {
    fn open_file(&self, path: &FsPath, mode: OpenMode) -> Result<File<'_>, FsError> {
        let file = self
            .service
            .open_file(path, mode)
            .map_err(|code| FsError::service("open_file", path.as_str(), code))?;
        let io = ManagedFile {
            backend: self,
            file: Some(file),
            path: path.clone(),
            commit_on_close: mode.write,
        };
        Ok(File::new(path.clone(), mode, io))
    }

    fn open_dir(&self, path: &FsPath, mode: DirMode) -> Result<Dir<'_>, FsError> {
        let dir = self
            .service
            .open_dir(path, mode)
            .map_err(|code| FsError::service("open_dir", path.as_str(), code))?;
        let io = ManagedDir {
            dir,
            path: path.clone(),
        };
        Ok(Dir::new(path.clone(), mode, io))
    }

    /// One directory per requested kind, counted natively.
    fn entry_counts(&self, path: &FsPath, mode: DirMode) -> Result<(u64, u64), FsError> {
        let dirs = if mode.dirs {
            self.native_count(path, DirMode::DIRS)?
        } else {
            0
        };
        let files = if mode.files {
            self.native_count(path, DirMode::FILES)?
        } else {
            0
        };
        Ok((files, dirs))
    }

    fn is_dir_empty(&self, path: &FsPath) -> Result<bool, FsError> {
        let (files, dirs) = self.entry_counts(path, DirMode::ALL)?;
        Ok(files + dirs == 0)
    }
}

struct ManagedFile<'a, S: StorageService> {
    backend: &'a ManagedBackend<S>,
    file: Option<S::File>,
    path: FsPath,
    commit_on_close: bool,
}

impl<S: StorageService> ManagedFile<'_, S> {
    fn file(&mut self, operation: &'static str) -> Result<&mut S::File, FsError> {
        self.file.as_mut().ok_or(FsError::NotActive { operation })
    }

    fn fault(&self, operation: &'static str) -> impl Fn(ResultCode) -> FsError + '_ {
        move |code| FsError::service(operation, self.path.as_str(), code)
    }
}

impl<S: StorageService> FileIo for ManagedFile<'_, S> {
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        let result = self.file("read")?.read(offset, buf);
        result.map_err(self.fault("read"))
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), FsError> {
        let result = self.file("write")?.write(offset, data);
        result.map_err(self.fault("write"))
    }

    fn set_size(&mut self, size: u64) -> Result<(), FsError> {
        let result = self.file("set_size")?.set_size(size);
        result.map_err(self.fault("set_size"))
    }

    fn size(&mut self) -> Result<u64, FsError> {
        let result = self.file("size")?.size();
        result.map_err(self.fault("size"))
    }

    fn close(&mut self) -> Result<(), FsError> {
        // Release the service handle before committing.
        if self.file.take().is_some() && self.commit_on_close {
            return self.backend.commit();
        }
        Ok(())
    }
}

struct ManagedDir<D> {
    dir: D,
    path: FsPath,
}

impl<D: ServiceDir> DirIo for ManagedDir<D> {
    fn entry_count(&mut self) -> Result<u64, FsError> {
        self.dir
            .entry_count()
            .map_err(|code| FsError::service("entry_count", self.path.as_str(), code))
    }

    fn read(&mut self, out: &mut Vec<DirEntry>, max_entries: usize) -> Result<usize, FsError> {
        let entries = self
            .dir
            .read(max_entries)
            .map_err(|code| FsError::service("read_dir", self.path.as_str(), code))?;
        let n = entries.len();
        out.extend(entries);
        Ok(n)
    }

    /// Sized once from the native count.
    fn read_all(&mut self) -> Result<Vec<DirEntry>, FsError> {
        let count = usize::try_from(self.entry_count()?).map_err(|_| FsError::Io {
            operation: "read_all",
            path: self.path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "entry count exceeds address space"),
        })?;
        let mut out = Vec::with_capacity(count);
        self.read(&mut out, count)?;
        Ok(out)
    }
}
