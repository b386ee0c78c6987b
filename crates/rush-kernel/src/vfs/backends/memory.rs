//! In-memory filesystem backend.
//!
//! Used for fixtures and scratch space. All data is ephemeral.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::VfsOps;
use crate::vfs::types::{DirEntry, FileAttr, FileType};

/// Node in the memory filesystem.
#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, attr: FileAttr },
    Directory { attr: FileAttr },
}

impl Node {
    fn attr(&self) -> &FileAttr {
        match self {
            Node::File { attr, .. } => attr,
            Node::Directory { attr } => attr,
        }
    }

    fn kind(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Directory { .. } => FileType::Directory,
        }
    }
}

/// In-memory filesystem backend.
///
/// Thread-safe via internal `RwLock`. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryBackend {
    nodes: RwLock<HashMap<PathBuf, Node>>,
    read_only: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        // Root directory always exists
        nodes.insert(
            PathBuf::new(),
            Node::Directory {
                attr: FileAttr::directory(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            read_only: false,
        }
    }

    /// Freeze the filesystem: every later write fails with `ReadOnly`.
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Create or overwrite a text file, creating parents as needed.
    pub fn insert_file(&self, path: impl AsRef<Path>, contents: &str) -> VfsResult<()> {
        self.check_writable()?;
        let normalized = Self::normalize(path.as_ref());
        if normalized.as_os_str().is_empty() {
            return Err(VfsError::is_a_directory("/"));
        }
        self.ensure_parents(&normalized)?;

        let mut nodes = self.nodes.write();
        if let Some(Node::Directory { .. }) = nodes.get(&normalized) {
            return Err(VfsError::is_a_directory(Self::path_str(&normalized)));
        }
        let data = contents.as_bytes().to_vec();
        let attr = FileAttr::file(data.len() as u64);
        nodes.insert(normalized, Node::File { data, attr });
        Ok(())
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.components() {
            match component {
                std::path::Component::RootDir => {}
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(s) => {
                    result.push(s);
                }
                std::path::Component::Prefix(_) => {}
            }
        }
        result
    }

    /// Ensure all parent directories exist.
    fn ensure_parents(&self, path: &Path) -> VfsResult<()> {
        let mut nodes = self.nodes.write();

        let mut current = PathBuf::new();
        for component in path.parent().into_iter().flat_map(|p| p.components()) {
            if let std::path::Component::Normal(s) = component {
                current.push(s);
                match nodes.get(&current) {
                    Some(Node::Directory { .. }) => {}
                    Some(Node::File { .. }) => {
                        return Err(VfsError::not_a_directory(Self::path_str(&current)));
                    }
                    None => {
                        nodes.insert(
                            current.clone(),
                            Node::Directory {
                                attr: FileAttr::directory(),
                            },
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Get the path string for error messages.
    fn path_str(path: &Path) -> String {
        path.display().to_string()
    }
}

impl VfsOps for MemoryBackend {
    fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read();

        nodes
            .get(&normalized)
            .map(|n| *n.attr())
            .ok_or_else(|| VfsError::not_found(Self::path_str(&normalized)))
    }

    fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read();

        match nodes.get(&normalized) {
            Some(Node::Directory { .. }) => {}
            Some(_) => return Err(VfsError::not_a_directory(Self::path_str(&normalized))),
            None => return Err(VfsError::not_found(Self::path_str(&normalized))),
        }

        // Direct children only; the root has no parent of its own.
        let mut result: Vec<DirEntry> = nodes
            .iter()
            .filter(|(node_path, _)| {
                *node_path != &normalized && node_path.parent() == Some(normalized.as_path())
            })
            .filter_map(|(node_path, node)| {
                node_path
                    .file_name()
                    .map(|name| DirEntry::new(name.to_string_lossy(), node.kind()))
            })
            .collect();

        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read();

        match nodes.get(&normalized) {
            Some(Node::File { data, .. }) => {
                let start = (offset as usize).min(data.len());
                let end = (start + size as usize).min(data.len());
                Ok(data[start..end].to_vec())
            }
            Some(Node::Directory { .. }) => {
                Err(VfsError::is_a_directory(Self::path_str(&normalized)))
            }
            None => Err(VfsError::not_found(Self::path_str(&normalized))),
        }
    }

    fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        let mut nodes = self.nodes.write();

        match nodes.get_mut(&normalized) {
            Some(Node::File {
                data: file_data,
                attr,
            }) => {
                let offset = offset as usize;
                // Extend if necessary
                if offset + data.len() > file_data.len() {
                    file_data.resize(offset + data.len(), 0);
                }
                file_data[offset..offset + data.len()].copy_from_slice(data);
                attr.size = file_data.len() as u64;
                Ok(data.len() as u32)
            }
            Some(Node::Directory { .. }) => {
                Err(VfsError::is_a_directory(Self::path_str(&normalized)))
            }
            None => Err(VfsError::not_found(Self::path_str(&normalized))),
        }
    }

    fn create(&self, path: &Path) -> VfsResult<FileAttr> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        self.ensure_parents(&normalized)?;

        let mut nodes = self.nodes.write();
        if nodes.contains_key(&normalized) {
            return Err(VfsError::already_exists(Self::path_str(&normalized)));
        }

        let attr = FileAttr::file(0);
        nodes.insert(
            normalized,
            Node::File {
                data: Vec::new(),
                attr,
            },
        );
        Ok(attr)
    }

    fn mkdir(&self, path: &Path) -> VfsResult<FileAttr> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        self.ensure_parents(&normalized)?;

        let mut nodes = self.nodes.write();
        if let Some(existing) = nodes.get(&normalized) {
            return match existing {
                Node::Directory { attr } => Ok(*attr),
                _ => Err(VfsError::already_exists(Self::path_str(&normalized))),
            };
        }

        let attr = FileAttr::directory();
        nodes.insert(normalized, Node::Directory { attr });
        Ok(attr)
    }

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        let mut nodes = self.nodes.write();

        match nodes.get_mut(&normalized) {
            Some(Node::File { data, attr }) => {
                data.resize(size as usize, 0);
                attr.size = size;
                Ok(())
            }
            Some(Node::Directory { .. }) => {
                Err(VfsError::is_a_directory(Self::path_str(&normalized)))
            }
            None => Err(VfsError::not_found(Self::path_str(&normalized))),
        }
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}
