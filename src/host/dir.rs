use std::ffi::OsStr;
use std::fs;

use crate::{DirEntry, DirIo, DirMode, FileType, FsError, FsPath};

/// How to probe an entry the stream could not classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Probe {
    /// Resolve links to their target's type.
    Follow,
    /// Report links as themselves, which classifies them as files.
    NoFollow,
}

/// Classify a directory entry.
///
/// The type cached by the enumeration is trusted only when it names a plain
/// file or directory. Links and unknown types fall back to a metadata probe;
/// if that fails too the entry is logged and reported as a file.
pub(super) fn classify(entry: &fs::DirEntry, probe: Probe) -> FileType {
    if let Ok(file_type) = entry.file_type() {
        if file_type.is_dir() {
            return FileType::Directory;
        }
        if file_type.is_file() {
            return FileType::File;
        }
    }

    let path = entry.path();
    let meta = match probe {
        Probe::Follow => fs::metadata(&path),
        Probe::NoFollow => fs::symlink_metadata(&path),
    };
    match meta {
        Ok(meta) if meta.is_dir() => FileType::Directory,
        Ok(_) => FileType::File,
        Err(error) => {
            tracing::warn!(
                target: "fsmount::host",
                path = %path.display(),
                %error,
                "unclassifiable entry, treating as file"
            );
            FileType::File
        }
    }
}

/// Streaming host directory enumeration.
pub(super) struct HostDir {
    path: FsPath,
    mode: DirMode,
    iter: fs::ReadDir,
}

impl HostDir {
    pub(super) fn open(path: FsPath, mode: DirMode) -> Result<Self, FsError> {
        let iter = read_dir(&path)?;
        Ok(Self { path, mode, iter })
    }

    fn rewind(&mut self) -> Result<(), FsError> {
        self.iter = read_dir(&self.path)?;
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<DirEntry>, FsError> {
        for entry in self.iter.by_ref() {
            let entry = entry.map_err(|e| FsError::io("read_dir", self.path.as_str(), e))?;
            let Some(name) = entry_name(&entry.file_name(), &self.path) else {
                continue;
            };
            let file_type = classify(&entry, Probe::Follow);
            if self.mode.accepts(file_type) {
                return Ok(Some(DirEntry { name, file_type }));
            }
        }
        Ok(None)
    }
}

/// The name to report for a raw entry, or `None` to skip it.
///
/// Dot entries are skipped, as are names over [`DirEntry::MAX_NAME_LEN`]
/// since no path below the directory could spell them.
fn entry_name(raw: &OsStr, dir: &FsPath) -> Option<String> {
    let name = raw.to_string_lossy();
    if name == "." || name == ".." {
        return None;
    }
    if name.len() > DirEntry::MAX_NAME_LEN {
        tracing::warn!(
            target: "fsmount::host",
            path = %dir,
            len = name.len(),
            "entry name too long, skipping"
        );
        return None;
    }
    Some(name.into_owned())
}

fn read_dir(path: &FsPath) -> Result<fs::ReadDir, FsError> {
    fs::read_dir(path.as_str()).map_err(|e| FsError::io("open_dir", path.as_str(), e))
}

impl DirIo for HostDir {
    /// Counts from the first entry and leaves the stream rewound. Rewinding
    /// reopens the directory, which is only reliable for local storage.
    fn entry_count(&mut self) -> Result<u64, FsError> {
        self.rewind()?;
        let mut count = 0;
        while self.next_entry()?.is_some() {
            count += 1;
        }
        self.rewind()?;
        Ok(count)
    }

    fn read(&mut self, out: &mut Vec<DirEntry>, max_entries: usize) -> Result<usize, FsError> {
        let mut n = 0;
        while n < max_entries {
            match self.next_entry()? {
                Some(entry) => {
                    out.push(entry);
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}
