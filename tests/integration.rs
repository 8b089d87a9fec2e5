//! Integration tests exercising both backends through the shared contract.
//!
//! Every property is checked against a host mount (a temporary directory)
//! and a managed mount (an in-memory transactional service), using only
//! `&dyn Backend`, the way callers are expected to.

use fsmount::*;
use tempfile::TempDir;

// =============================================================================
// Mount fixtures
// =============================================================================

struct Mount {
    name: &'static str,
    backend: Box<dyn Backend>,
    root: FsPath,
    _tmp: Option<TempDir>,
}

impl Mount {
    fn at(&self, relative: &str) -> FsPath {
        self.root.append(relative).unwrap()
    }
}

/// A host and a managed mount, each with `protected` (relative to the mount
/// root) as read-only roots.
fn mounts_protecting(protected: &[&str]) -> Vec<Mount> {
    let tmp = tempfile::tempdir().unwrap();
    let host_root = FsPath::new(tmp.path().to_string_lossy()).unwrap();
    let managed_root = FsPath::new("/work").unwrap();

    let policy_for = |root: &FsPath| {
        let roots: Vec<String> = protected
            .iter()
            .map(|rel| root.append(rel).unwrap().to_string())
            .collect();
        SafetyPolicy::new(roots, Vec::<String>::new())
    };

    let managed = ManagedBackend::new(MemoryService::new(), policy_for(&managed_root));
    managed
        .create_dir(&managed_root, PolicyMode::Enforce)
        .unwrap();

    vec![
        Mount {
            name: "host",
            backend: Box::new(HostBackend::new(policy_for(&host_root))),
            root: host_root,
            _tmp: Some(tmp),
        },
        Mount {
            name: "managed",
            backend: Box::new(managed),
            root: managed_root,
            _tmp: None,
        },
    ]
}

fn mounts() -> Vec<Mount> {
    mounts_protecting(&[])
}

fn sorted_names(fs: &dyn Backend, path: &FsPath) -> Vec<String> {
    let mut dir = fs.open_dir(path, DirMode::ALL).unwrap();
    let mut names: Vec<_> = dir.read_all().unwrap().into_iter().map(|e| e.name).collect();
    names.sort();
    names
}

// =============================================================================
// Recursive directory creation
// =============================================================================

#[test]
fn mkdir_p_is_idempotent() {
    for m in mounts() {
        verify_mkdir_p_is_idempotent(&*m.backend, &m);
    }
}

fn verify_mkdir_p_is_idempotent(fs: &dyn Backend, m: &Mount) {
    let deep = m.at("a/b/c");
    fs.create_dir_all(&deep, PolicyMode::Enforce).unwrap();
    let before = sorted_names(fs, &m.at("a/b"));
    fs.create_dir_all(&deep, PolicyMode::Enforce).unwrap();
    assert_eq!(sorted_names(fs, &m.at("a/b")), before, "{}", m.name);
    assert!(fs.dir_exists(&deep), "{}", m.name);
}

#[test]
fn mkdir_p_through_existing_file_fails() {
    for m in mounts() {
        let fs = &*m.backend;
        fs.write_entire_file(&m.at("blocker"), b"x", PolicyMode::Enforce)
            .unwrap();
        assert!(
            fs.create_dir_all(&m.at("blocker/sub"), PolicyMode::Enforce)
                .is_err(),
            "{}",
            m.name
        );
    }
}

// =============================================================================
// Safety policy
// =============================================================================

#[test]
fn policy_blocks_mutation_under_read_only_root() {
    for m in mounts_protecting(&["locked"]) {
        verify_policy_blocks(&*m.backend, &m);
    }
}

fn verify_policy_blocks(fs: &dyn Backend, m: &Mount) {
    let locked = m.at("locked");
    let file = m.at("locked/f.bin");
    fs.create_dir(&locked, PolicyMode::Ignore).unwrap();
    fs.write_entire_file(&file, b"keep", PolicyMode::Ignore)
        .unwrap();

    let read_only = |r: Result<(), FsError>| matches!(r, Err(FsError::ReadOnly { .. }));
    assert!(read_only(fs.delete_file(&file, PolicyMode::Enforce)), "{}", m.name);
    assert!(read_only(fs.delete_dir(&locked, PolicyMode::Enforce)), "{}", m.name);
    assert!(read_only(fs.delete_dir_all(&locked, PolicyMode::Enforce)), "{}", m.name);
    assert!(
        read_only(fs.create_file(&m.at("locked/new"), 0, CreateOptions::NONE, PolicyMode::Enforce)),
        "{}",
        m.name
    );
    assert!(
        read_only(fs.rename_file(&file, &m.at("escaped.bin"), PolicyMode::Enforce)),
        "{}",
        m.name
    );
    assert!(
        read_only(fs.write_entire_file(&file, b"overwrite", PolicyMode::Enforce)),
        "{}",
        m.name
    );

    // Nothing observable changed.
    assert_eq!(fs.read_entire_file(&file).unwrap(), b"keep", "{}", m.name);
    assert!(!fs.file_exists(&m.at("locked/new")), "{}", m.name);
    assert!(!fs.file_exists(&m.at("escaped.bin")), "{}", m.name);

    // Ignoring the policy lets the same calls through.
    let moved = m.at("locked/g.bin");
    fs.create_file(&m.at("locked/new"), 0, CreateOptions::NONE, PolicyMode::Ignore)
        .unwrap();
    fs.rename_file(&file, &moved, PolicyMode::Ignore).unwrap();
    fs.delete_file(&moved, PolicyMode::Ignore).unwrap();
    fs.delete_file(&m.at("locked/new"), PolicyMode::Ignore)
        .unwrap();
    fs.delete_dir(&locked, PolicyMode::Ignore).unwrap();
    assert!(!fs.dir_exists(&locked), "{}", m.name);
}

#[test]
fn rename_into_read_only_root_is_blocked() {
    for m in mounts_protecting(&["locked"]) {
        let fs = &*m.backend;
        fs.write_entire_file(&m.at("free.bin"), b"x", PolicyMode::Enforce)
            .unwrap();
        assert!(matches!(
            fs.rename_file(&m.at("free.bin"), &m.at("locked/f.bin"), PolicyMode::Enforce),
            Err(FsError::ReadOnly { .. })
        ));
        assert!(fs.file_exists(&m.at("free.bin")), "{}", m.name);
    }
}

#[test]
fn nested_read_only_root_creates_no_ancestors() {
    for m in mounts_protecting(&["outer/inner"]) {
        verify_nested_root(&*m.backend, &m);
    }
}

fn verify_nested_root(fs: &dyn Backend, m: &Mount) {
    let read_only = |r: Result<(), FsError>| matches!(r, Err(FsError::ReadOnly { .. }));
    assert!(
        read_only(fs.create_dir_all(&m.at("outer/inner/x"), PolicyMode::Enforce)),
        "{}",
        m.name
    );
    assert!(
        read_only(fs.create_parent_dirs(&m.at("outer/inner/x/f.bin"), PolicyMode::Enforce)),
        "{}",
        m.name
    );
    assert!(!fs.dir_exists(&m.at("outer")), "{}", m.name);

    // The unprotected ancestor on its own is fine.
    fs.create_dir_all(&m.at("outer/other"), PolicyMode::Enforce)
        .unwrap();
    assert!(fs.dir_exists(&m.at("outer/other")), "{}", m.name);
    assert!(!fs.dir_exists(&m.at("outer/inner")), "{}", m.name);
}

#[test]
fn non_canonical_spellings_are_blocked() {
    for m in mounts_protecting(&["locked"]) {
        verify_non_canonical_spellings(&*m.backend, &m);
    }
}

fn verify_non_canonical_spellings(fs: &dyn Backend, m: &Mount) {
    let file = m.at("locked/f.bin");
    fs.create_dir_all(&m.at("locked"), PolicyMode::Ignore)
        .unwrap();
    fs.create_dir(&m.at("other"), PolicyMode::Enforce).unwrap();
    fs.write_entire_file(&file, b"keep", PolicyMode::Ignore)
        .unwrap();

    for spelling in [
        format!("{}//locked/f.bin", m.root),
        format!("{}/locked//f.bin", m.root),
        format!("{}/./locked/f.bin", m.root),
        format!("{}/other/../locked/f.bin", m.root),
    ] {
        let alias = FsPath::new(spelling.as_str()).unwrap();
        assert!(
            matches!(
                fs.delete_file(&alias, PolicyMode::Enforce),
                Err(FsError::ReadOnly { .. })
            ),
            "{}: {spelling}",
            m.name
        );
        assert!(
            matches!(
                fs.write_entire_file(&alias, b"overwrite", PolicyMode::Enforce),
                Err(FsError::ReadOnly { .. })
            ),
            "{}: {spelling}",
            m.name
        );
    }

    let alias_dir = FsPath::new(format!("{}//locked/sub", m.root)).unwrap();
    assert!(
        matches!(
            fs.create_dir_all(&alias_dir, PolicyMode::Enforce),
            Err(FsError::ReadOnly { .. })
        ),
        "{}",
        m.name
    );
    assert_eq!(fs.read_entire_file(&file).unwrap(), b"keep", "{}", m.name);
    assert!(!fs.dir_exists(&m.at("locked/sub")), "{}", m.name);
}

#[test]
fn sibling_with_shared_prefix_is_not_protected() {
    for m in mounts_protecting(&["backup"]) {
        let fs = &*m.backend;
        fs.create_dir_all(&m.at("backup2/x"), PolicyMode::Enforce)
            .unwrap();
        fs.delete_dir_all(&m.at("backup2"), PolicyMode::Enforce)
            .unwrap();
    }
}

#[test]
fn root_deletion_is_always_refused() {
    for m in mounts() {
        assert!(matches!(
            m.backend
                .delete_dir_all(&FsPath::root(), PolicyMode::Enforce),
            Err(FsError::ReadOnly { .. })
        ));
    }
}

// =============================================================================
// Whole-file helpers
// =============================================================================

#[test]
fn write_then_read_round_trips() {
    for m in mounts() {
        let fs = &*m.backend;
        let path = m.at("blob.bin");
        for content in [&b""[..], b"x", &[0xa5; 4096][..]] {
            fs.write_entire_file(&path, content, PolicyMode::Enforce)
                .unwrap();
            assert_eq!(fs.read_entire_file(&path).unwrap(), content, "{}", m.name);
        }
    }
}

#[test]
fn copy_duplicates_content() {
    for m in mounts() {
        let fs = &*m.backend;
        fs.write_entire_file(&m.at("src"), b"payload", PolicyMode::Enforce)
            .unwrap();
        fs.copy_entire_file(&m.at("src"), &m.at("dst"), PolicyMode::Enforce)
            .unwrap();
        assert_eq!(fs.read_entire_file(&m.at("dst")).unwrap(), b"payload", "{}", m.name);
    }
}

#[test]
fn failed_copy_never_touches_destination() {
    for m in mounts() {
        let fs = &*m.backend;
        fs.write_entire_file(&m.at("dst"), b"original", PolicyMode::Enforce)
            .unwrap();
        let err = fs
            .copy_entire_file(&m.at("missing"), &m.at("dst"), PolicyMode::Enforce)
            .unwrap_err();
        assert!(err.is_not_found(), "{}: {err}", m.name);
        assert_eq!(fs.read_entire_file(&m.at("dst")).unwrap(), b"original", "{}", m.name);
    }
}

// =============================================================================
// Recursive deletion
// =============================================================================

#[test]
fn delete_dir_all_leaves_no_trace() {
    for m in mounts() {
        verify_delete_dir_all(&*m.backend, &m);
    }
}

fn verify_delete_dir_all(fs: &dyn Backend, m: &Mount) {
    let top = m.at("tree");
    fs.create_dir_all(&m.at("tree/empty"), PolicyMode::Enforce)
        .unwrap();
    fs.create_dir_all(&m.at("tree/full/deeper"), PolicyMode::Enforce)
        .unwrap();
    fs.write_entire_file(&m.at("tree/a.txt"), b"a", PolicyMode::Enforce)
        .unwrap();
    fs.write_entire_file(&m.at("tree/full/deeper/b.txt"), b"b", PolicyMode::Enforce)
        .unwrap();

    assert!(matches!(
        fs.delete_dir(&top, PolicyMode::Enforce),
        Err(FsError::DirectoryNotEmpty { .. })
    ));
    fs.delete_dir_all(&top, PolicyMode::Enforce).unwrap();
    assert!(fs.stat(&top).unwrap_err().is_not_found(), "{}", m.name);
    assert!(!fs.file_exists(&m.at("tree/full/deeper/b.txt")), "{}", m.name);
}

#[cfg(unix)]
#[test]
fn host_recursive_delete_treats_links_as_leaves() {
    let m = mounts().remove(0);
    let fs = &*m.backend;
    fs.create_dir_all(&m.at("outside"), PolicyMode::Enforce)
        .unwrap();
    fs.write_entire_file(&m.at("outside/keep.txt"), b"k", PolicyMode::Enforce)
        .unwrap();
    fs.create_dir_all(&m.at("victim"), PolicyMode::Enforce)
        .unwrap();
    std::os::unix::fs::symlink(m.at("outside").as_str(), m.at("victim/link").as_str()).unwrap();

    // Listing follows the link.
    let mut dir = fs.open_dir(&m.at("victim"), DirMode::DIRS).unwrap();
    assert_eq!(dir.read_all().unwrap().len(), 1);
    dir.close().unwrap();

    fs.delete_dir_all(&m.at("victim"), PolicyMode::Enforce)
        .unwrap();
    assert!(!fs.dir_exists(&m.at("victim")));
    assert!(fs.file_exists(&m.at("outside/keep.txt")));
}

// =============================================================================
// Handles
// =============================================================================

#[test]
fn closing_twice_is_harmless() {
    for m in mounts() {
        let fs = &*m.backend;
        let path = m.at("h.bin");
        fs.write_entire_file(&path, b"abc", PolicyMode::Enforce)
            .unwrap();

        let mut file = fs.open_file(&path, OpenMode::READ_WRITE).unwrap();
        file.close().unwrap();
        file.close().unwrap();
        assert!(matches!(file.size(), Err(FsError::NotActive { .. })));

        let mut never_opened = File::closed();
        never_opened.close().unwrap();

        let mut dir = fs.open_dir(&m.root, DirMode::ALL).unwrap();
        dir.close().unwrap();
        dir.close().unwrap();
    }
}

#[test]
fn open_missing_file_is_not_found() {
    for m in mounts() {
        let err = m
            .backend
            .open_file(&m.at("nope"), OpenMode::READ)
            .unwrap_err();
        assert!(err.is_not_found(), "{}: {err}", m.name);
    }
}

#[test]
fn handles_serve_as_transfer_endpoints() {
    for m in mounts() {
        let fs = &*m.backend;
        let path = m.at("chunked.bin");
        fs.create_file(&path, 0, CreateOptions::NONE, PolicyMode::Enforce)
            .unwrap();

        let mut src = MemSource::new(b"0123456789abcdef");
        let total = src.size().unwrap();
        let mut sink = fs.open_file(&path, OpenMode::WRITE).unwrap();
        let mut buf = [0u8; 5];
        let mut offset = 0;
        while offset < total {
            let n = src.read_at(offset, &mut buf).unwrap();
            assert_eq!(sink.write_at(offset, &buf[..n]).unwrap(), n);
            offset += n as u64;
        }
        sink.close().unwrap();

        let mut check = fs.open_file(&path, OpenMode::READ).unwrap();
        assert_eq!(ReadSource::size(&mut check).unwrap(), 16, "{}", m.name);
        let mut tail = [0u8; 8];
        assert_eq!(check.read_at(12, &mut tail).unwrap(), 4);
        assert_eq!(&tail[..4], b"cdef");
    }
}

#[test]
fn entry_counts_split_by_kind() {
    for m in mounts() {
        let fs = &*m.backend;
        fs.create_dir_all(&m.at("d/sub1"), PolicyMode::Enforce).unwrap();
        fs.create_dir(&m.at("d/sub2"), PolicyMode::Enforce).unwrap();
        fs.write_entire_file(&m.at("d/f"), b"", PolicyMode::Enforce)
            .unwrap();

        assert_eq!(fs.entry_counts(&m.at("d"), DirMode::ALL).unwrap(), (1, 2), "{}", m.name);
        assert_eq!(fs.entry_count(&m.at("d"), DirMode::FILES).unwrap(), 1, "{}", m.name);

        let mut dir = fs.open_dir(&m.at("d"), DirMode::DIRS).unwrap();
        assert_eq!(dir.entry_count().unwrap(), 2, "{}", m.name);
        assert_eq!(dir.read_all().unwrap().len(), 2, "{}", m.name);
    }
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[test]
fn scenario_create_write_delete() {
    for m in mounts() {
        verify_scenario(&*m.backend, &m);
    }
}

fn verify_scenario(fs: &dyn Backend, m: &Mount) {
    let leaf = m.at("a/b/c");
    fs.create_dir_all(&leaf, PolicyMode::Enforce).unwrap();
    assert!(fs.is_dir_empty(&leaf).unwrap(), "{}", m.name);

    let file = m.at("a/b/c/f.bin");
    fs.write_entire_file(&file, &[7u8; 10], PolicyMode::Enforce)
        .unwrap();
    let mut handle = fs.open_file(&file, OpenMode::READ).unwrap();
    assert_eq!(handle.size().unwrap(), 10, "{}", m.name);
    handle.close().unwrap();
    assert!(!fs.is_dir_empty(&leaf).unwrap(), "{}", m.name);

    let (size, ts) = fs.size_and_timestamps(&file).unwrap();
    assert_eq!(size, 10);
    assert!(ts.is_valid);

    fs.delete_dir_all(&m.at("a"), PolicyMode::Enforce).unwrap();
    assert!(fs.stat(&m.at("a")).unwrap_err().is_not_found(), "{}", m.name);
}

// =============================================================================
// Trait composition
// =============================================================================

#[test]
fn generic_function_with_backend_bound() {
    fn stage<B: Backend + ?Sized>(fs: &B, root: &FsPath) -> Result<Vec<u8>, FsError> {
        let path = root.append("staged/out.bin")?;
        fs.create_parent_dirs(&path, PolicyMode::Enforce)?;
        fs.write_entire_file(&path, b"staged", PolicyMode::Enforce)?;
        fs.read_entire_file(&path)
    }

    let managed = ManagedBackend::new(MemoryService::new(), SafetyPolicy::default());
    assert_eq!(stage(&managed, &FsPath::root()).unwrap(), b"staged");

    for m in mounts() {
        assert_eq!(stage(&*m.backend, &m.root).unwrap(), b"staged", "{}", m.name);
    }
}

#[test]
fn backends_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HostBackend>();
    assert_send_sync::<ManagedBackend<MemoryService>>();
    assert_send_sync::<Box<dyn Backend>>();
}
