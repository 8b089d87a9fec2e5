//! Bounded path values.
//!
//! An [`FsPath`] is a `/`-separated location, either absolute (`/a/b`) or
//! scheme-qualified (`sdmc:/a/b`). Its length is capped at
//! [`FsPath::MAX_LEN`] bytes; anything longer is rejected with
//! [`FsError::PathTooLong`] rather than truncated.

use std::fmt;
use std::str::FromStr;

use crate::FsError;

/// A bounded, `/`-separated filesystem path.
///
/// # Example
///
/// ```rust
/// use fsmount::FsPath;
///
/// let root = FsPath::new("/switch/app")?;
/// let file = root.append("/cache/data.bin")?;
/// assert_eq!(file.as_str(), "/switch/app/cache/data.bin");
/// assert_eq!(file.parent().as_str(), "/switch/app/cache");
/// # Ok::<(), fsmount::FsError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct FsPath(String);

impl FsPath {
    /// Maximum path length in bytes (the provider's 0x301 limit minus the terminator).
    pub const MAX_LEN: usize = 0x300;

    /// Create a path, failing if it exceeds [`FsPath::MAX_LEN`].
    pub fn new(path: impl Into<String>) -> Result<Self, FsError> {
        let path = path.into();
        if path.len() > Self::MAX_LEN {
            return Err(FsError::PathTooLong {
                len: path.len(),
                limit: Self::MAX_LEN,
            });
        }
        Ok(Self(path))
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// The path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The scheme of a scheme-qualified path (`sdmc` in `sdmc:/a`).
    pub fn scheme(&self) -> Option<&str> {
        scheme_of(&self.0)
    }

    /// The path with any `scheme:` prefix removed.
    pub fn without_scheme(&self) -> &str {
        strip_scheme(&self.0)
    }

    /// The prefix that components are appended to when rebuilding this path
    /// left to right: `scheme:/`, `/`, or empty for relative paths.
    pub(crate) fn anchor(&self) -> String {
        match self.scheme() {
            Some(scheme) => format!("{scheme}:/"),
            None if self.0.starts_with('/') => "/".to_owned(),
            None => String::new(),
        }
    }

    /// Components after any scheme prefix, resolved lexically: empty and `.`
    /// components are dropped and `..` removes the one before it.
    ///
    /// ```rust
    /// use fsmount::FsPath;
    ///
    /// let path = FsPath::new("sdmc://switch/./app/../prod.keys")?;
    /// assert_eq!(path.components().collect::<Vec<_>>(), ["switch", "prod.keys"]);
    /// # Ok::<(), fsmount::FsError>(())
    /// ```
    pub fn components(&self) -> impl Iterator<Item = &str> {
        resolve_components(&self.0).into_iter()
    }

    /// The final component, or an empty string if there is none.
    pub fn file_name(&self) -> &str {
        self.components().last().unwrap_or("")
    }

    /// Everything before the last `/`. A path without a separator yields
    /// itself.
    pub fn parent(&self) -> FsPath {
        match self.0.rfind('/') {
            Some(idx) => Self(self.0[..idx].to_owned()),
            None => self.clone(),
        }
    }

    /// Returns `true` if this path contains a `/` separator.
    #[inline]
    pub fn has_separator(&self) -> bool {
        self.0.contains('/')
    }

    /// Append `relative` to this path. See [`append_path`].
    pub fn append(&self, relative: &str) -> Result<FsPath, FsError> {
        append_path(self, relative)
    }
}

fn scheme_of(path: &str) -> Option<&str> {
    let colon = path.find(':')?;
    match path.find('/') {
        Some(slash) if slash < colon => None,
        _ => Some(&path[..colon]),
    }
}

fn strip_scheme(path: &str) -> &str {
    match scheme_of(path) {
        Some(scheme) => &path[scheme.len() + 1..],
        None => path,
    }
}

/// The components `path` names once its scheme is stripped and `.`/`..`
/// are resolved. `..` at the top stays at the top.
pub(crate) fn resolve_components(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for component in strip_scheme(path).split('/') {
        match component {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            name => out.push(name),
        }
    }
    out
}

/// Join `relative` onto `root` with exactly one `/` between them.
///
/// Leading `/` characters are stripped from `relative`. An empty `root`
/// yields the stripped `relative` unchanged; a `root` already ending in `/`
/// gets no extra separator.
///
/// ```rust
/// use fsmount::{append_path, FsPath};
///
/// let joined = append_path(&FsPath::new("/a/b/")?, "/c")?;
/// assert_eq!(joined.as_str(), "/a/b/c");
/// # Ok::<(), fsmount::FsError>(())
/// ```
pub fn append_path(root: &FsPath, relative: &str) -> Result<FsPath, FsError> {
    let relative = relative.trim_start_matches('/');
    let joined = if root.is_empty() {
        relative.to_owned()
    } else if root.0.ends_with('/') {
        format!("{}{}", root.0, relative)
    } else {
        format!("{}/{}", root.0, relative)
    };
    FsPath::new(joined)
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FsPath {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for FsPath {
    type Error = FsError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for FsPath {
    type Error = FsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<FsPath> for String {
    fn from(path: FsPath) -> Self {
        path.0
    }
}
