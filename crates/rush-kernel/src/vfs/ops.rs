//! VFS operations trait.
//!
//! Path-based, blocking filesystem operations. Backends implement the
//! primitives; whole-file helpers are provided on top of them.

use std::path::{Path, PathBuf};

use super::types::{DirEntry, FileAttr};
use super::VfsResult;

/// Core VFS operations trait.
///
/// Paths are always relative to the backend's root; a leading `/` is
/// accepted and ignored.
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes. Symlinks are reported as symlinks, not followed.
    fn getattr(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Attributes of whatever `path` leads to, following symlinks.
    ///
    /// A dangling link is `NotFound`; a link leaving the root is
    /// `PathEscapesRoot`. Backends without links can rely on `getattr`.
    fn stat(&self, path: &Path) -> VfsResult<FileAttr> {
        self.getattr(path)
    }

    /// Read directory entries, sorted by name.
    fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Read up to `size` bytes starting at `offset`.
    ///
    /// Returns fewer bytes if EOF is reached.
    fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write `data` at `offset`. Returns the number of bytes written.
    fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32>;

    /// Create a new, empty file.
    fn create(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Create a new directory (parents included).
    fn mkdir(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Truncate a file to the specified size.
    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns true if this filesystem is read-only.
    fn read_only(&self) -> bool;

    /// Location of `path` on the host filesystem, if the backend has one.
    ///
    /// External tools can only be pointed at paths that exist on the host.
    fn host_path(&self, path: &Path) -> Option<PathBuf> {
        let _ = path;
        None
    }

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool {
        self.getattr(path).is_ok()
    }

    /// Read entire file contents.
    fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let attr = self.getattr(path)?;
        self.read(path, 0, attr.size as u32)
    }

    /// Write entire file contents, truncating or creating as needed.
    fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        if self.exists(path) {
            self.truncate(path, 0)?;
        } else {
            self.create(path)?;
        }
        self.write(path, 0, data)?;
        Ok(())
    }
}
