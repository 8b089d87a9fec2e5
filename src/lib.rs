//! # fsmount
//!
//! A uniform storage layer over two kinds of provider: the host filesystem
//! and a transactional storage service that needs an explicit commit.
//!
//! Callers pick a backend once, at mount time, and from then on work only
//! through the [`Backend`] contract. Recursive directory operations and
//! whole-file helpers are written once on top of that contract, and every
//! mutation passes through an injected [`SafetyPolicy`] that keeps system
//! areas read-only.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use fsmount::{Backend, BackendExt, FsError, FsPath, PolicyMode};
//!
//! fn install<B: Backend + ?Sized>(backend: &B, payload: &[u8]) -> Result<(), FsError> {
//!     let path = FsPath::new("/switch/app/app.nro")?;
//!     backend.create_parent_dirs(&path, PolicyMode::Enforce)?;
//!     backend.write_entire_file(&path, payload, PolicyMode::Enforce)?;
//!     assert_eq!(backend.read_entire_file(&path)?, payload);
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Backend`] | Capability contract: mutate, query, open |
//! | [`BackendExt`] | `mkdir -p`, recursive helpers, whole-file I/O |
//! | [`HostBackend`] | Host filesystem via `std::fs` |
//! | [`ManagedBackend`] | Any [`StorageService`], committing after each mutation |
//! | [`MemoryService`] | In-memory [`StorageService`] with commit and rollback |
//! | [`File`] / [`Dir`] | Handles that release their descriptor exactly once |
//! | [`FsPath`] | Bounded path with optional `scheme:` prefix |
//! | [`SafetyPolicy`] | Read-only roots and files |
//! | [`FsError`] | Error type with context |
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! FsMutate + FsQuery + FsOpen = Backend
//!                                  ↓
//!                              BackendExt (blanket)
//! ```
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FsError>`. Provider codes are mapped onto
//! the distinguished variants, so callers never match on raw codes:
//!
//! ```rust
//! use fsmount::{FsError, FsPath, PolicyMode, SafetyPolicy, HostBackend, FsMutate};
//!
//! let backend = HostBackend::new(SafetyPolicy::default());
//! let err = backend
//!     .delete_dir_all(&FsPath::new("/backup")?, PolicyMode::Enforce)
//!     .unwrap_err();
//! assert!(matches!(err, FsError::ReadOnly { .. }));
//! # Ok::<(), FsError>(())
//! ```
//!
//! ---
//!
//! ## Concurrency
//!
//! Calls are synchronous and may block on provider I/O. Backends are
//! `Send + Sync`, but handles to the same path with a writer among them must
//! be serialized by the caller. Handles borrow their backend and cannot
//! outlive it.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`SafetyPolicy`], [`DirEntry`], [`Timestamps`], [`FsPath`], plus `SafetyPolicy::from_json` |

// Private modules
mod dir;
mod error;
mod ext;
mod file;
mod host;
mod managed;
mod path;
mod policy;
mod source;
mod traits;
mod types;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use path::{FsPath, append_path};
pub use policy::{DEFAULT_READ_ONLY_FILES, DEFAULT_READ_ONLY_ROOTS, SafetyPolicy};
pub use types::{CreateOptions, DirEntry, DirMode, FileType, OpenMode, PolicyMode, Timestamps};

// Public re-exports - backend contract
pub use traits::{Backend, FsMutate, FsOpen, FsQuery};

// Public re-exports - handles
pub use dir::{Dir, DirIo};
pub use file::{File, FileIo};
pub use source::{MemSource, ReadSource, WriteSink};

// Public re-exports - backends
pub use host::HostBackend;
pub use managed::{
    ManagedBackend, MemoryDir, MemoryFile, MemoryService, ResultCode, ServiceDir, ServiceFile,
    StorageService,
};

// Public re-exports - infrastructure
pub use ext::BackendExt;
