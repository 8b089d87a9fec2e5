//! Protected-path policy.
//!
//! A [`SafetyPolicy`] holds two sets: *read-only roots*, which protect every
//! path at or below them, and *read-only files*, which protect exact paths.
//! Backends receive the policy at construction and consult it before every
//! mutating call unless the caller passes [`PolicyMode::Ignore`]. Paths are
//! matched by lexically resolved components, so doubled separators, `.` and
//! `..` cannot step around a protected entry.

use crate::path::resolve_components;
use crate::{FsError, FsPath, PolicyMode};

/// Folders whose contents cannot be modified.
pub const DEFAULT_READ_ONLY_ROOTS: &[&str] = &[
    "/atmosphere/automatic_backups",
    "/bootloader/res",
    "/bootloader/sys",
    "/backup",
    "/Nintendo",
    "/Nintendo/Contents",
    "/Nintendo/save",
    "/emuMMC",
    "/warmboot_mariko",
];

/// Exact paths that cannot be removed or renamed.
pub const DEFAULT_READ_ONLY_FILES: &[&str] = &[
    "/",
    "/atmosphere",
    "/atmosphere/hbl.nsp",
    "/atmosphere/package3",
    "/atmosphere/reboot_payload.bin",
    "/atmosphere/stratosphere.romfs",
    "/bootloader",
    "/bootloader/hekate_ipl.ini",
    "/switch",
    "/hbmenu.nro",
    "/payload.bin",
    "/boot.dat",
    "/license.dat",
    "/switch/prod.keys",
    "/switch/title.keys",
    "/switch/reboot_to_payload.nro",
];

/// Immutable set of protected paths.
///
/// Matching ignores any `scheme:` prefix, so `sdmc:/backup/x` is protected by
/// the root `/backup`. Root matching is by whole components: `/backup2` is
/// not under `/backup`.
///
/// # Example
///
/// ```rust
/// use fsmount::{FsPath, SafetyPolicy};
///
/// let policy = SafetyPolicy::new(["/data/keep"], ["/data/config.ini"]);
/// assert!(policy.is_protected(&FsPath::new("/data/keep/a.bin")?));
/// assert!(policy.is_protected(&FsPath::new("/data/config.ini")?));
/// assert!(!policy.is_protected(&FsPath::new("/data/keep2")?));
/// assert!(policy.is_protected(&FsPath::root()));
/// # Ok::<(), fsmount::FsError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyPolicy {
    read_only_roots: Vec<String>,
    read_only_files: Vec<String>,
}

impl SafetyPolicy {
    /// Build a policy from custom sets. `/` is always added to the files.
    pub fn new<R, F>(roots: R, files: F) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let read_only_roots = roots.into_iter().map(normalize).collect();
        let mut read_only_files: Vec<String> = files.into_iter().map(normalize).collect();
        if !read_only_files.iter().any(|f| f == "/") {
            read_only_files.push("/".to_owned());
        }
        Self {
            read_only_roots,
            read_only_files,
        }
    }

    /// A policy protecting only `/`.
    pub fn root_only() -> Self {
        Self::new(Vec::<String>::new(), Vec::<String>::new())
    }

    /// Load a policy from JSON of the form
    /// `{"read_only_roots": [...], "read_only_files": [...]}`.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: SafetyPolicy = serde_json::from_str(json)?;
        Ok(Self::new(raw.read_only_roots, raw.read_only_files))
    }

    /// The read-only roots.
    pub fn read_only_roots(&self) -> &[String] {
        &self.read_only_roots
    }

    /// The read-only files.
    pub fn read_only_files(&self) -> &[String] {
        &self.read_only_files
    }

    /// Returns `true` if `path` is at or below a read-only root.
    ///
    /// Paths are compared by resolved components, so `//backup/x` and
    /// `/switch/../backup/x` are both under `/backup`.
    pub fn is_read_only_root(&self, path: &FsPath) -> bool {
        let path: Vec<&str> = path.components().collect();
        self.read_only_roots
            .iter()
            .any(|root| path.starts_with(&resolve_components(root)))
    }

    /// Returns `true` if `path` names a read-only file.
    pub fn is_read_only_file(&self, path: &FsPath) -> bool {
        let path: Vec<&str> = path.components().collect();
        self.read_only_files
            .iter()
            .any(|file| path == resolve_components(file))
    }

    /// Returns `true` if `path` is protected by either set.
    pub fn is_protected(&self, path: &FsPath) -> bool {
        self.is_read_only_root(path) || self.is_read_only_file(path)
    }

    /// Guard for destructive operations (delete, rename).
    pub(crate) fn check_destroy(
        &self,
        path: &FsPath,
        mode: PolicyMode,
        operation: &'static str,
    ) -> Result<(), FsError> {
        if mode == PolicyMode::Enforce && self.is_protected(path) {
            return Err(read_only(path, operation));
        }
        Ok(())
    }

    /// Guard for create operations. Creation cannot destroy an existing exact
    /// path, so only the read-only roots apply; this keeps ancestors such as
    /// `/switch` reachable for recursive creation below them.
    pub(crate) fn check_create(
        &self,
        path: &FsPath,
        mode: PolicyMode,
        operation: &'static str,
    ) -> Result<(), FsError> {
        if mode == PolicyMode::Enforce && self.is_read_only_root(path) {
            return Err(read_only(path, operation));
        }
        Ok(())
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_READ_ONLY_ROOTS.iter().copied(),
            DEFAULT_READ_ONLY_FILES.iter().copied(),
        )
    }
}

fn read_only(path: &FsPath, operation: &'static str) -> FsError {
    tracing::debug!(target: "fsmount::policy", %path, operation, "blocked by safety policy");
    FsError::ReadOnly {
        path: path.to_string(),
        operation,
    }
}

fn normalize(path: impl Into<String>) -> String {
    let path = path.into();
    trim_trailing(&path).to_owned()
}

fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> FsPath {
        FsPath::new(s).unwrap()
    }

    #[test]
    fn root_prefix_matches_by_component() {
        let policy = SafetyPolicy::default();
        assert!(policy.is_protected(&p("/backup")));
        assert!(policy.is_protected(&p("/backup/nand.bin")));
        assert!(!policy.is_protected(&p("/backup2")));
        assert!(!policy.is_protected(&p("/backup2/x")));
    }

    #[test]
    fn exact_files_do_not_protect_children() {
        let policy = SafetyPolicy::default();
        assert!(policy.is_protected(&p("/switch")));
        assert!(policy.is_protected(&p("/switch/prod.keys")));
        assert!(!policy.is_protected(&p("/switch/app.nro")));
    }

    #[test]
    fn root_always_protected() {
        assert!(SafetyPolicy::root_only().is_protected(&p("/")));
        let custom = SafetyPolicy::new(["/x"], Vec::<String>::new());
        assert!(custom.is_read_only_file(&p("/")));
        assert!(custom.is_read_only_file(&p("//")));
    }

    #[test]
    fn scheme_prefix_is_ignored() {
        let policy = SafetyPolicy::default();
        assert!(policy.is_protected(&p("sdmc:/Nintendo/save/0001")));
        assert!(policy.is_protected(&p("sdmc:/")));
    }

    #[test]
    fn trailing_slashes_normalized() {
        let policy = SafetyPolicy::new(["/keep/"], ["/cfg.ini/"]);
        assert_eq!(policy.read_only_roots(), ["/keep"]);
        assert!(policy.is_protected(&p("/keep/a")));
        assert!(policy.is_protected(&p("/cfg.ini")));
    }

    #[test]
    fn non_canonical_spellings_are_protected() {
        let policy = SafetyPolicy::default();
        assert!(policy.is_protected(&p("//backup/nand.bin")));
        assert!(policy.is_protected(&p("/backup//x")));
        assert!(policy.is_protected(&p("/switch//prod.keys")));
        assert!(policy.is_protected(&p("/switch/./prod.keys")));
        assert!(policy.is_protected(&p("/switch/../backup/x")));
        assert!(policy.is_protected(&p("/switch/../")));
        assert!(policy.is_protected(&p("sdmc://Nintendo/./save")));
        assert!(!policy.is_protected(&p("/backup/../backup2")));
    }

    #[test]
    fn check_respects_policy_mode() {
        let policy = SafetyPolicy::default();
        let path = p("/emuMMC/RAW1");
        assert!(matches!(
            policy.check_destroy(&path, PolicyMode::Enforce, "delete_file"),
            Err(FsError::ReadOnly { operation: "delete_file", .. })
        ));
        assert!(policy.check_destroy(&path, PolicyMode::Ignore, "delete_file").is_ok());
    }

    #[test]
    fn create_checks_roots_only() {
        let policy = SafetyPolicy::default();
        assert!(policy
            .check_create(&p("/switch"), PolicyMode::Enforce, "create_dir")
            .is_ok());
        assert!(policy
            .check_create(&p("/backup/new"), PolicyMode::Enforce, "create_dir")
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn policy_from_json() {
        let policy = SafetyPolicy::from_json(
            r#"{"read_only_roots": ["/saves"], "read_only_files": ["/boot.ini"]}"#,
        )
        .unwrap();
        assert!(policy.is_protected(&p("/saves/1")));
        assert!(policy.is_protected(&p("/boot.ini")));
        assert!(policy.is_protected(&p("/")));
    }
}
