//! Local filesystem backend.
//!
//! Provides access to real filesystem paths, with path security
//! to prevent escaping the root directory.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::VfsOps;
use crate::vfs::types::{DirEntry, FileAttr, FileType};

/// Local filesystem backend.
///
/// All operations are relative to `root`. For example, if `root` is
/// `/home/amy/project`, then `read("src/main.rs")` reads
/// `/home/amy/project/src/main.rs`.
///
/// Path security is enforced: attempts to escape via `..` or via a
/// symlink pointing outside the root are blocked.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    read_only: bool,
}

impl LocalBackend {
    /// Create a new local filesystem rooted at the given path.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            read_only: false,
        }
    }

    /// Create a read-only local filesystem.
    pub fn read_only(root: impl Into<PathBuf>) -> Self {
        let mut backend = Self::new(root);
        backend.read_only = true;
        backend
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `path` onto the root, rejecting `..` that climbs above it.
    fn join(&self, path: &Path) -> VfsResult<PathBuf> {
        let mut relative = PathBuf::new();
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(VfsError::path_escapes_root(path));
                    }
                }
                Component::Normal(s) => relative.push(s),
            }
        }
        Ok(self.root.join(relative))
    }

    /// Resolve a path without following its final component.
    ///
    /// Used for metadata so that symlinks are reported as symlinks.
    fn resolve_entry(&self, path: &Path) -> VfsResult<PathBuf> {
        let full = self.join(path)?;
        if full == self.root {
            return Ok(full);
        }

        let (Some(parent), Some(name)) = (full.parent(), full.file_name()) else {
            return Err(VfsError::invalid_path(path.display().to_string()));
        };

        let resolved = match dunce::canonicalize(parent) {
            Ok(parent) => parent.join(name),
            // Parent doesn't exist, will fail on actual operation
            Err(_) => full.clone(),
        };
        self.check_contained(&resolved)?;
        Ok(resolved)
    }

    /// Resolve a path following symlinks, for content access.
    fn resolve(&self, path: &Path) -> VfsResult<PathBuf> {
        let full = self.join(path)?;
        let resolved = if full.exists() {
            dunce::canonicalize(&full)?
        } else {
            self.resolve_entry(path)?
        };
        self.check_contained(&resolved)?;
        Ok(resolved)
    }

    fn check_contained(&self, resolved: &Path) -> VfsResult<()> {
        if resolved.starts_with(&self.root) {
            Ok(())
        } else {
            Err(VfsError::path_escapes_root(resolved))
        }
    }

    /// Check if write operations are allowed.
    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn kind_of(file_type: fs::FileType) -> FileType {
        if file_type.is_dir() {
            FileType::Directory
        } else if file_type.is_symlink() {
            FileType::Symlink
        } else {
            FileType::File
        }
    }

    fn metadata_to_attr(meta: &fs::Metadata) -> FileAttr {
        let kind = Self::kind_of(meta.file_type());
        let size = if kind.is_dir() { 0 } else { meta.len() };
        FileAttr::new(kind, size)
    }
}

impl VfsOps for LocalBackend {
    fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let full_path = self.resolve_entry(path)?;
        let meta = fs::symlink_metadata(&full_path)?;
        Ok(Self::metadata_to_attr(&meta))
    }

    fn stat(&self, path: &Path) -> VfsResult<FileAttr> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path)?;
        Ok(Self::metadata_to_attr(&meta))
    }

    fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let full_path = self.resolve(path)?;
        if !full_path.is_dir() {
            return Err(VfsError::not_a_directory(path.display().to_string()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&full_path)? {
            let entry = entry?;
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy(),
                Self::kind_of(entry.file_type()?),
            ));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(path)?;
        if full_path.is_dir() {
            return Err(VfsError::is_a_directory(path.display().to_string()));
        }

        let mut file = fs::File::open(&full_path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = Vec::with_capacity(size as usize);
        file.take(size as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;

        let mut file = fs::OpenOptions::new().write(true).open(&full_path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        Ok(data.len() as u32)
    }

    fn create(&self, path: &Path) -> VfsResult<FileAttr> {
        self.check_writable()?;
        let full_path = self.resolve_entry(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)?;

        let meta = file.metadata()?;
        Ok(Self::metadata_to_attr(&meta))
    }

    fn mkdir(&self, path: &Path) -> VfsResult<FileAttr> {
        self.check_writable()?;
        let full_path = self.resolve_entry(path)?;
        fs::create_dir_all(&full_path)?;

        let meta = fs::metadata(&full_path)?;
        Ok(Self::metadata_to_attr(&meta))
    }

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;

        let file = fs::OpenOptions::new().write(true).open(&full_path)?;
        file.set_len(size)?;
        Ok(())
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn host_path(&self, path: &Path) -> Option<PathBuf> {
        self.resolve_entry(path).ok()
    }

    // Symlinked files report the link length from getattr, so read through
    // the target instead of trusting that size.
    fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(path)?;
        if full_path.is_dir() {
            return Err(VfsError::is_a_directory(path.display().to_string()));
        }
        Ok(fs::read(&full_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (LocalBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path());
        (backend, dir)
    }

    #[test]
    fn test_create_and_read() {
        let (backend, _dir) = setup();

        backend.create(Path::new("test.txt")).unwrap();
        backend.write(Path::new("test.txt"), 0, b"hello world").unwrap();

        let data = backend.read(Path::new("test.txt"), 0, 100).unwrap();
        assert_eq!(data, b"hello world");
    }

    #[test]
    fn test_partial_read() {
        let (backend, _dir) = setup();

        backend.create(Path::new("test.txt")).unwrap();
        backend.write(Path::new("test.txt"), 0, b"hello world").unwrap();

        let data = backend.read(Path::new("test.txt"), 6, 5).unwrap();
        assert_eq!(data, b"world");
    }

    #[test]
    fn test_mkdir_and_readdir() {
        let (backend, _dir) = setup();

        backend.mkdir(Path::new("subdir")).unwrap();
        backend.create(Path::new("subdir/file.txt")).unwrap();
        backend.create(Path::new("root.txt")).unwrap();

        let entries = backend.readdir(Path::new("")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["root.txt", "subdir"]);
        assert!(entries[1].kind.is_dir());
    }

    #[test]
    fn test_read_only() {
        let (_, dir) = setup();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let backend = LocalBackend::read_only(dir.path());

        assert!(backend.read_only());
        assert!(matches!(
            backend.create(Path::new("test.txt")),
            Err(VfsError::ReadOnly)
        ));
        assert!(matches!(
            backend.write_all(Path::new("a.txt"), b"y"),
            Err(VfsError::ReadOnly)
        ));
        assert_eq!(backend.read_all(Path::new("a.txt")).unwrap(), b"x");
    }

    #[test]
    fn test_path_escape_blocked() {
        let (backend, _dir) = setup();

        let result = backend.read(Path::new("../../../etc/passwd"), 0, 100);
        assert!(matches!(result, Err(VfsError::PathEscapesRoot(_))));
    }

    #[test]
    fn test_symlink_reported_and_readable() {
        let (backend, dir) = setup();
        std::fs::write(dir.path().join("target.txt"), "content").unwrap();
        std::os::unix::fs::symlink("target.txt", dir.path().join("link.txt")).unwrap();

        let attr = backend.getattr(Path::new("link.txt")).unwrap();
        assert!(attr.kind == FileType::Symlink);
        assert!(backend.stat(Path::new("link.txt")).unwrap().is_file());
        assert_eq!(backend.read_all(Path::new("link.txt")).unwrap(), b"content");
    }

    #[test]
    fn test_symlink_escape_blocked() {
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let (backend, dir) = setup();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("escape.txt"),
        )
        .unwrap();

        let result = backend.read_all(Path::new("escape.txt"));
        assert!(matches!(result, Err(VfsError::PathEscapesRoot(_))));
    }

    #[test]
    fn test_stat_follows_links() {
        let (backend, dir) = setup();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink("real", dir.path().join("alias")).unwrap();
        std::os::unix::fs::symlink("gone.txt", dir.path().join("dangling")).unwrap();

        assert!(backend.getattr(Path::new("alias")).unwrap().kind == FileType::Symlink);
        assert!(backend.stat(Path::new("alias")).unwrap().kind.is_dir());
        assert!(backend.getattr(Path::new("dangling")).unwrap().kind == FileType::Symlink);
        assert!(backend.stat(Path::new("dangling")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_truncate() {
        let (backend, _dir) = setup();

        backend.create(Path::new("test.txt")).unwrap();
        backend.write(Path::new("test.txt"), 0, b"hello world").unwrap();
        backend.truncate(Path::new("test.txt"), 5).unwrap();

        let data = backend.read(Path::new("test.txt"), 0, 100).unwrap();
        assert_eq!(data, b"hello");
    }

    #[test]
    fn test_host_path() {
        let (backend, dir) = setup();
        std::fs::write(dir.path().join("test.txt"), "hello").unwrap();

        let real = backend.host_path(Path::new("/test.txt")).unwrap();
        assert!(real.is_absolute());
        assert!(real.ends_with("test.txt"));
        assert!(real.starts_with(backend.root()));
    }

    #[test]
    fn test_host_path_escape_prevention() {
        let (backend, _dir) = setup();
        assert!(backend.host_path(Path::new("../etc/passwd")).is_none());
    }
}
