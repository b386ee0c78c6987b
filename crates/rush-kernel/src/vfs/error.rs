//! Errors from backends and from entry content access.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Why a backend operation failed. Path-carrying variants hold the path
/// as the caller named it.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("{0}: no such file or directory")]
    NotFound(String),

    #[error("{0}: already exists")]
    AlreadyExists(String),

    #[error("backend is read-only")]
    ReadOnly,

    #[error("{0}: not a directory")]
    NotADirectory(String),

    #[error("{0}: is a directory")]
    IsADirectory(String),

    /// `..` or a symlink that leads outside the backend root.
    #[error("{0}: outside the backend root")]
    PathEscapesRoot(String),

    /// Malformed path or glob pattern.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Content is not UTF-8, so line-based commands cannot use it.
    #[error("{0}: not a text file")]
    NotText(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn shown(path: impl AsRef<Path>) -> String {
    path.as_ref().display().to_string()
}

impl VfsError {
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound(shown(path))
    }

    pub fn already_exists(path: impl AsRef<Path>) -> Self {
        Self::AlreadyExists(shown(path))
    }

    pub fn not_a_directory(path: impl AsRef<Path>) -> Self {
        Self::NotADirectory(shown(path))
    }

    pub fn is_a_directory(path: impl AsRef<Path>) -> Self {
        Self::IsADirectory(shown(path))
    }

    pub fn path_escapes_root(path: impl AsRef<Path>) -> Self {
        Self::PathEscapesRoot(shown(path))
    }

    pub fn invalid_path(detail: impl Into<String>) -> Self {
        Self::InvalidPath(detail.into())
    }

    pub fn not_text(path: impl AsRef<Path>) -> Self {
        Self::NotText(shown(path))
    }

    /// True when the path is gone, whether a backend noticed or the OS did.
    pub fn is_not_found(&self) -> bool {
        match self {
            VfsError::NotFound(_) => true,
            VfsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type VfsResult<T> = Result<T, VfsError>;
