//! Virtual Filesystem abstraction.
//!
//! Entries handed to the command layer are backed by a [`VfsOps`]
//! implementation:
//!
//! - [`MemoryBackend`] - In-memory filesystem (fixtures, scratch space)
//! - [`LocalBackend`] - Local filesystem access (with path security)
//!
//! Operations are path-based and blocking. Directory listings are sorted
//! by name so that walks are deterministic.

pub mod backends;
mod error;
mod ops;
mod types;

pub use backends::{LocalBackend, MemoryBackend};
pub use error::{VfsError, VfsResult};
pub use ops::VfsOps;
pub use types::{DirEntry, FileAttr, FileType};
