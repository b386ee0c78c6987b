//! Metadata returned by backends.

use serde::{Deserialize, Serialize};

/// What a path is on its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Directory,
    /// Reported by `getattr` for the link itself; `stat` reports the target.
    Symlink,
}

impl FileType {
    pub fn is_file(self) -> bool {
        self == FileType::File
    }

    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }
}

/// Kind and length of a path. Content commands need nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub kind: FileType,
    /// Length in bytes; zero for directories.
    pub size: u64,
}

impl FileAttr {
    pub fn new(kind: FileType, size: u64) -> Self {
        Self { kind, size }
    }

    pub fn file(size: u64) -> Self {
        Self::new(FileType::File, size)
    }

    pub fn directory() -> Self {
        Self::new(FileType::Directory, 0)
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

/// One child in a directory listing: its name and its unfollowed kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: FileType,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
