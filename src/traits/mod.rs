//! # Backend Traits
//!
//! The capability contract both backends implement.
//!
//! ```text
//! FsMutate + FsQuery + FsOpen = Backend
//! ```
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`FsMutate`] | `create_file`, `create_dir`, `delete_*`, `rename_*`, `commit` |
//! | [`FsQuery`] | `stat`, `stat_timestamps`, `set_timestamps` |
//! | [`FsOpen`] | `open_file`, `open_dir`, `entry_counts`, `is_dir_empty` |
//!
//! [`Backend`] has a blanket implementation: implement the three component
//! traits and the composite comes for free. Callers select a backend once
//! and then work through `&dyn Backend` or a `B: Backend` bound, never
//! testing which variant they hold.

mod fs_mutate;
mod fs_open;
mod fs_query;

pub use fs_mutate::FsMutate;
pub use fs_open::FsOpen;
pub use fs_query::FsQuery;

/// A mounted storage provider.
///
/// # Example
///
/// ```rust
/// use fsmount::{Backend, BackendExt, FsError, FsPath, PolicyMode};
///
/// fn stage<B: Backend + ?Sized>(backend: &B, data: &[u8]) -> Result<(), FsError> {
///     let path = FsPath::new("/stage/payload.bin")?;
///     backend.create_parent_dirs(&path, PolicyMode::Enforce)?;
///     backend.write_entire_file(&path, data, PolicyMode::Enforce)
/// }
/// ```
pub trait Backend: FsMutate + FsQuery + FsOpen {}

// Blanket implementation
impl<T: FsMutate + FsQuery + FsOpen> Backend for T {}
