//! Transactional in-memory storage service.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;

use super::service::{ResultCode, ServiceDir, ServiceFile, StorageService};
use crate::{CreateOptions, DirEntry, DirMode, FileType, FsPath, OpenMode, Timestamps};

/// An in-memory [`StorageService`] with staged mutations.
///
/// Every mutation, including writes through open files, lands in a staged
/// tree. [`commit`](StorageService::commit) publishes the staged tree;
/// [`rollback`](MemoryService::rollback) throws it away, as a crash before
/// commit would. Clones share the same storage.
///
/// Bytes past the written data up to the file size read as zero. Storage
/// grows to the highest byte written; a large size alone allocates nothing,
/// but a write far into a file fills the gap before it.
#[derive(Debug, Clone, Default)]
pub struct MemoryService {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    commits: AtomicU64,
}

#[derive(Debug, Default)]
struct State {
    staged: Tree,
    committed: Tree,
}

/// Nodes keyed by normalized path; the root `/` is implicit.
#[derive(Debug, Clone, Default)]
struct Tree {
    nodes: BTreeMap<String, Node>,
}

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Vec<u8>,
        len: u64,
        created: SystemTime,
        modified: SystemTime,
    },
    Dir {
        created: SystemTime,
    },
}

impl Node {
    fn file_type(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Dir { .. } => FileType::Directory,
        }
    }
}

impl MemoryService {
    /// An empty service containing only the root directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every mutation since the last commit.
    pub fn rollback(&self) {
        let mut state = self.inner.state.lock();
        state.staged = state.committed.clone();
    }

    /// Number of commits performed so far.
    pub fn commit_count(&self) -> u64 {
        self.inner.commits.load(Ordering::SeqCst)
    }
}

fn key(path: &FsPath) -> String {
    let mut key = String::with_capacity(path.len() + 1);
    for component in path.components() {
        key.push('/');
        key.push_str(component);
    }
    if key.is_empty() {
        key.push('/');
    }
    key
}

fn parent_key(key: &str) -> &str {
    match key.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &key[..idx],
    }
}

fn is_descendant(candidate: &str, ancestor: &str) -> bool {
    candidate
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

impl Tree {
    fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    fn is_dir(&self, key: &str) -> bool {
        key == "/" || matches!(self.nodes.get(key), Some(Node::Dir { .. }))
    }

    fn exists(&self, key: &str) -> bool {
        key == "/" || self.nodes.contains_key(key)
    }

    fn children(&self, key: &str) -> impl Iterator<Item = (&String, &Node)> {
        let prefix = if key == "/" {
            String::from("/")
        } else {
            format!("{key}/")
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(prefix.as_str()))
            .filter(move |(k, _)| parent_key(k) == key)
    }

    fn has_children(&self, key: &str) -> bool {
        self.children(key).next().is_some()
    }

    fn create(&mut self, key: String, node: Node) -> Result<(), ResultCode> {
        if self.exists(&key) {
            return Err(ResultCode::PATH_ALREADY_EXISTS);
        }
        if !self.is_dir(parent_key(&key)) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        self.nodes.insert(key, node);
        Ok(())
    }

    fn remove_subtree(&mut self, key: &str) {
        self.nodes.retain(|k, _| k != key && !is_descendant(k, key));
    }

    fn file_mut(&mut self, key: &str) -> Result<(&mut Vec<u8>, &mut u64, &mut SystemTime), ResultCode> {
        match self.nodes.get_mut(key) {
            Some(Node::File {
                data,
                len,
                modified,
                ..
            }) => Ok((data, len, modified)),
            _ => Err(ResultCode::PATH_NOT_FOUND),
        }
    }
}

impl StorageService for MemoryService {
    type File = MemoryFile;
    type Dir = MemoryDir;

    fn create_file(&self, path: &FsPath, size: u64, options: CreateOptions) -> Result<(), ResultCode> {
        if size >= CreateOptions::BIG_FILE_THRESHOLD && !options.contains(CreateOptions::BIG_FILE) {
            return Err(ResultCode::OUT_OF_RANGE);
        }
        let now = SystemTime::now();
        self.inner.state.lock().staged.create(
            key(path),
            Node::File {
                data: Vec::new(),
                len: size,
                created: now,
                modified: now,
            },
        )
    }

    fn create_dir(&self, path: &FsPath) -> Result<(), ResultCode> {
        self.inner.state.lock().staged.create(
            key(path),
            Node::Dir {
                created: SystemTime::now(),
            },
        )
    }

    fn delete_file(&self, path: &FsPath) -> Result<(), ResultCode> {
        let key = key(path);
        let mut state = self.inner.state.lock();
        match state.staged.get(&key) {
            Some(Node::File { .. }) => {
                state.staged.nodes.remove(&key);
                Ok(())
            }
            _ => Err(ResultCode::PATH_NOT_FOUND),
        }
    }

    fn delete_dir(&self, path: &FsPath) -> Result<(), ResultCode> {
        let key = key(path);
        if key == "/" {
            return Err(ResultCode::UNSUPPORTED_OPERATION);
        }
        let mut state = self.inner.state.lock();
        if !matches!(state.staged.get(&key), Some(Node::Dir { .. })) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        if state.staged.has_children(&key) {
            return Err(ResultCode::DIRECTORY_NOT_EMPTY);
        }
        state.staged.nodes.remove(&key);
        Ok(())
    }

    fn delete_dir_recursively(&self, path: &FsPath) -> Result<(), ResultCode> {
        let key = key(path);
        if key == "/" {
            return Err(ResultCode::UNSUPPORTED_OPERATION);
        }
        let mut state = self.inner.state.lock();
        if !matches!(state.staged.get(&key), Some(Node::Dir { .. })) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        state.staged.remove_subtree(&key);
        Ok(())
    }

    fn rename_file(&self, from: &FsPath, to: &FsPath) -> Result<(), ResultCode> {
        let (from, to) = (key(from), key(to));
        let mut state = self.inner.state.lock();
        let tree = &mut state.staged;
        if !matches!(tree.get(&from), Some(Node::File { .. })) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        if tree.exists(&to) {
            return Err(ResultCode::PATH_ALREADY_EXISTS);
        }
        if !tree.is_dir(parent_key(&to)) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        if let Some(node) = tree.nodes.remove(&from) {
            tree.nodes.insert(to, node);
        }
        Ok(())
    }

    fn rename_dir(&self, from: &FsPath, to: &FsPath) -> Result<(), ResultCode> {
        let (from, to) = (key(from), key(to));
        if from == "/" || is_descendant(&to, &from) {
            return Err(ResultCode::UNSUPPORTED_OPERATION);
        }
        let mut state = self.inner.state.lock();
        let tree = &mut state.staged;
        if !matches!(tree.get(&from), Some(Node::Dir { .. })) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        if tree.exists(&to) {
            return Err(ResultCode::PATH_ALREADY_EXISTS);
        }
        if !tree.is_dir(parent_key(&to)) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        let moved: Vec<String> = tree
            .nodes
            .keys()
            .filter(|k| **k == from || is_descendant(k, &from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = tree.nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                tree.nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn entry_type(&self, path: &FsPath) -> Result<FileType, ResultCode> {
        let key = key(path);
        if key == "/" {
            return Ok(FileType::Directory);
        }
        self.inner
            .state
            .lock()
            .staged
            .get(&key)
            .map(Node::file_type)
            .ok_or(ResultCode::PATH_NOT_FOUND)
    }

    fn timestamps(&self, path: &FsPath) -> Result<Timestamps, ResultCode> {
        let key = key(path);
        let state = self.inner.state.lock();
        let (created, modified) = match state.staged.get(&key) {
            Some(Node::File {
                created, modified, ..
            }) => (*created, *modified),
            Some(Node::Dir { created }) => (*created, *created),
            None => return Err(ResultCode::PATH_NOT_FOUND),
        };
        Ok(Timestamps {
            created,
            modified,
            accessed: modified,
            is_valid: true,
        })
    }

    fn open_file(&self, path: &FsPath, mode: OpenMode) -> Result<MemoryFile, ResultCode> {
        if !mode.read && !mode.write {
            return Err(ResultCode::INVALID_OPEN_MODE);
        }
        let key = key(path);
        match self.inner.state.lock().staged.get(&key) {
            Some(Node::File { .. }) => Ok(MemoryFile {
                inner: Arc::clone(&self.inner),
                key,
                mode,
            }),
            _ => Err(ResultCode::PATH_NOT_FOUND),
        }
    }

    fn open_dir(&self, path: &FsPath, mode: DirMode) -> Result<MemoryDir, ResultCode> {
        let key = key(path);
        let state = self.inner.state.lock();
        if !state.staged.is_dir(&key) {
            return Err(ResultCode::PATH_NOT_FOUND);
        }
        let entries = state
            .staged
            .children(&key)
            .filter(|(_, node)| mode.accepts(node.file_type()))
            .map(|(k, node)| DirEntry {
                name: k[parent_key(k).len()..].trim_start_matches('/').to_owned(),
                file_type: node.file_type(),
            })
            .collect();
        Ok(MemoryDir { entries, pos: 0 })
    }

    fn commit(&self) -> Result<(), ResultCode> {
        let mut state = self.inner.state.lock();
        state.committed = state.staged.clone();
        self.inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An open [`MemoryService`] file.
#[derive(Debug)]
pub struct MemoryFile {
    inner: Arc<Inner>,
    key: String,
    mode: OpenMode,
}

impl ServiceFile for MemoryFile {
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, ResultCode> {
        if !self.mode.read {
            return Err(ResultCode::INVALID_OPEN_MODE);
        }
        let mut state = self.inner.state.lock();
        let (data, len, _) = state.staged.file_mut(&self.key)?;
        if offset >= *len {
            return Ok(0);
        }
        let n = usize::try_from(*len - offset).map_or(buf.len(), |avail| avail.min(buf.len()));
        let out = &mut buf[..n];
        out.fill(0);
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if let Some(stored) = data.get(start..) {
            let copied = stored.len().min(n);
            out[..copied].copy_from_slice(&stored[..copied]);
        }
        Ok(n)
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), ResultCode> {
        if !self.mode.write {
            return Err(ResultCode::INVALID_OPEN_MODE);
        }
        let mut state = self.inner.state.lock();
        let (data, len, modified) = state.staged.file_mut(&self.key)?;
        let start = usize::try_from(offset).map_err(|_| ResultCode::OUT_OF_RANGE)?;
        let end = start
            .checked_add(bytes.len())
            .ok_or(ResultCode::OUT_OF_RANGE)?;
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        *len = (*len).max(end as u64);
        *modified = SystemTime::now();
        Ok(())
    }

    fn set_size(&mut self, size: u64) -> Result<(), ResultCode> {
        if !self.mode.write {
            return Err(ResultCode::INVALID_OPEN_MODE);
        }
        let mut state = self.inner.state.lock();
        let (data, len, modified) = state.staged.file_mut(&self.key)?;
        if (data.len() as u64) > size {
            data.truncate(size as usize);
        }
        *len = size;
        *modified = SystemTime::now();
        Ok(())
    }

    fn size(&mut self) -> Result<u64, ResultCode> {
        let mut state = self.inner.state.lock();
        let (_, len, _) = state.staged.file_mut(&self.key)?;
        Ok(*len)
    }
}

/// An open [`MemoryService`] directory, snapshotted at open time.
#[derive(Debug)]
pub struct MemoryDir {
    entries: Vec<DirEntry>,
    pos: usize,
}

impl ServiceDir for MemoryDir {
    fn entry_count(&mut self) -> Result<u64, ResultCode> {
        Ok(self.entries.len() as u64)
    }

    fn read(&mut self, max_entries: usize) -> Result<Vec<DirEntry>, ResultCode> {
        let end = self.entries.len().min(self.pos.saturating_add(max_entries));
        let batch = self.entries[self.pos..end].to_vec();
        self.pos = end;
        Ok(batch)
    }
}
