//! Core types shared by both backends.

use std::time::SystemTime;

/// Type of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file. Also used for entries that could not be classified.
    File,
    /// Directory.
    Directory,
}

/// A single entry returned from directory enumeration.
///
/// `.` and `..` are never produced, and backends never produce a name longer
/// than [`DirEntry::MAX_NAME_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (not the full path).
    pub name: String,
    /// Type of the entry.
    pub file_type: FileType,
}

impl DirEntry {
    /// Longest name enumeration yields, in bytes.
    pub const MAX_NAME_LEN: usize = crate::FsPath::MAX_LEN;

    /// Returns `true` if this entry is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Access mode for opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode {
    /// Open for reading.
    pub read: bool,
    /// Open for writing. Never truncates.
    pub write: bool,
}

impl OpenMode {
    /// Read-only access.
    pub const READ: Self = Self {
        read: true,
        write: false,
    };

    /// Write access. The host store opens this as read+write.
    pub const WRITE: Self = Self {
        read: false,
        write: true,
    };

    /// Read and write access.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
    };
}

/// Which entry kinds a directory handle yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirMode {
    /// Yield files.
    pub files: bool,
    /// Yield directories.
    pub dirs: bool,
}

impl DirMode {
    /// Files only.
    pub const FILES: Self = Self {
        files: true,
        dirs: false,
    };

    /// Directories only.
    pub const DIRS: Self = Self {
        files: false,
        dirs: true,
    };

    /// Files and directories.
    pub const ALL: Self = Self {
        files: true,
        dirs: true,
    };

    /// Returns `true` if entries of `file_type` pass this filter.
    #[inline]
    pub fn accepts(&self, file_type: FileType) -> bool {
        match file_type {
            FileType::File => self.files,
            FileType::Directory => self.dirs,
        }
    }
}

impl Default for DirMode {
    fn default() -> Self {
        Self::ALL
    }
}

/// Options for file creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateOptions(u32);

impl CreateOptions {
    /// No options.
    pub const NONE: Self = Self(0);

    /// Large-file hint required by the managed service for sizes of 4 GiB and up.
    pub const BIG_FILE: Self = Self(1);

    /// Size at and above which [`CreateOptions::BIG_FILE`] is forced.
    pub const BIG_FILE_THRESHOLD: u64 = 4 * 1024 * 1024 * 1024;

    /// Raw option bits.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if all bits of `other` are set.
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two option sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Options adjusted for a file of `size` bytes.
    pub const fn for_size(self, size: u64) -> Self {
        if size >= Self::BIG_FILE_THRESHOLD {
            self.union(Self::BIG_FILE)
        } else {
            self
        }
    }
}

/// Whether a mutating call honours the safety policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyMode {
    /// Refuse protected paths with [`FsError::ReadOnly`](crate::FsError::ReadOnly).
    #[default]
    Enforce,
    /// Skip the policy check. Reserved for privileged maintenance flows.
    Ignore,
}

/// Creation, modification and access times of an entry.
///
/// `is_valid` is `false` when the provider could not report times; the time
/// fields are then `UNIX_EPOCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamps {
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub created: SystemTime,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Last access time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub accessed: SystemTime,
    /// Whether the fields above carry real values.
    pub is_valid: bool,
}

impl Default for Timestamps {
    fn default() -> Self {
        Self {
            created: SystemTime::UNIX_EPOCH,
            modified: SystemTime::UNIX_EPOCH,
            accessed: SystemTime::UNIX_EPOCH,
            is_valid: false,
        }
    }
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
