//! Entry handles: files and directories living in a VFS backend.
//!
//! An [`Entry`] is a cheap handle (backend + path + kind). Content is read
//! on demand, so an entry always reflects what is currently on the backend.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::vfs::{FileType, VfsError, VfsOps, VfsResult};

/// One line of an entry that matched a search pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-based line number.
    pub line_number: usize,
    /// The full text of the line, without its terminator.
    pub line: String,
}

impl LineMatch {
    pub fn new(line_number: usize, line: impl Into<String>) -> Self {
        Self {
            line_number,
            line: line.into(),
        }
    }
}

/// A file, directory or symlink on a VFS backend.
#[derive(Clone, Serialize)]
pub struct Entry {
    #[serde(skip)]
    vfs: Arc<dyn VfsOps>,
    path: PathBuf,
    kind: FileType,
}

impl Entry {
    /// Create an entry handle without touching the backend.
    pub fn new(vfs: Arc<dyn VfsOps>, path: impl Into<PathBuf>, kind: FileType) -> Self {
        Self {
            vfs,
            path: path.into(),
            kind,
        }
    }

    /// Open an existing path, reading its kind from the backend.
    pub fn open(vfs: Arc<dyn VfsOps>, path: impl Into<PathBuf>) -> VfsResult<Self> {
        let path = path.into();
        let attr = vfs.getattr(&path)?;
        Ok(Self::new(vfs, path, attr.kind))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileType {
        self.kind
    }

    /// Final path component, or `/` for the root.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string())
    }

    /// True for containers. Content operations skip these.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Whether content commands read this entry.
    ///
    /// Directories never do. A symlink does only when it leads to a regular
    /// file inside the backend; links to directories, dangling links and
    /// links leaving the root are skipped.
    pub fn has_content(&self) -> bool {
        match self.kind {
            FileType::File => true,
            FileType::Directory => false,
            FileType::Symlink => match self.vfs.stat(&self.path) {
                Ok(target) => target.is_file(),
                Err(e) => {
                    tracing::debug!(path = %self, error = %e, "skipping unresolvable symlink");
                    false
                }
            },
        }
    }

    /// The backend this entry lives on.
    pub fn vfs(&self) -> &Arc<dyn VfsOps> {
        &self.vfs
    }

    /// View this entry as a directory, if it is one.
    pub fn as_dir(&self) -> Option<Dir> {
        self.is_dir().then(|| Dir(self.clone()))
    }

    /// Path to hand to external programs: the host path when the backend
    /// has one, the virtual path otherwise.
    pub fn full_path(&self) -> PathBuf {
        self.vfs
            .host_path(&self.path)
            .unwrap_or_else(|| self.path.clone())
    }

    /// [`full_path`](Self::full_path), quoted for interpolation into a
    /// `sh -c` command line.
    pub fn quoted_path(&self) -> String {
        let path = self.full_path().to_string_lossy().into_owned();
        match shlex::try_quote(&path) {
            Ok(quoted) => quoted.into_owned(),
            // Only interior NUL bytes are rejected; fall back to plain single quoting.
            Err(_) => format!("'{}'", path.replace('\'', r"'\''")),
        }
    }

    /// Raw content as UTF-8 text.
    pub fn contents(&self) -> VfsResult<String> {
        if self.is_dir() {
            return Err(VfsError::is_a_directory(self.to_string()));
        }
        let bytes = self.vfs.read_all(&self.path)?;
        String::from_utf8(bytes).map_err(|_| VfsError::not_text(self.to_string()))
    }

    /// Content split into lines. A trailing newline does not add an empty line.
    pub fn lines(&self) -> VfsResult<Vec<String>> {
        Ok(self.contents()?.lines().map(String::from).collect())
    }

    /// Lines matching `pattern`, in file order.
    pub fn search(&self, pattern: &Regex) -> VfsResult<Vec<LineMatch>> {
        let contents = self.contents()?;
        Ok(contents
            .lines()
            .enumerate()
            .filter(|(_, line)| pattern.is_match(line))
            .map(|(idx, line)| LineMatch::new(idx + 1, line))
            .collect())
    }

    /// Replace every match of `pattern` with `with` (regex replacement
    /// syntax, `$1` etc.) and write the result back.
    ///
    /// Returns `false` and leaves the file untouched when nothing matched.
    pub fn replace_contents(&self, pattern: &Regex, with: &str) -> VfsResult<bool> {
        let contents = self.contents()?;
        let replaced = pattern.replace_all(&contents, with);
        if replaced == contents {
            return Ok(false);
        }
        self.write(&replaced)?;
        Ok(true)
    }

    /// Overwrite the whole content.
    pub fn write(&self, contents: &str) -> VfsResult<()> {
        if self.is_dir() {
            return Err(VfsError::is_a_directory(self.to_string()));
        }
        self.vfs.write_all(&self.path, contents.as_bytes())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Two handles are equal when they name the same path on the same backend.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.vfs, &other.vfs) && self.path == other.path && self.kind == other.kind
    }
}

impl Eq for Entry {}

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir(Entry);

impl Dir {
    /// Open `path`, failing unless it is a directory.
    pub fn open(vfs: Arc<dyn VfsOps>, path: impl Into<PathBuf>) -> VfsResult<Self> {
        let entry = Entry::open(vfs, path)?;
        if !entry.is_dir() {
            return Err(VfsError::not_a_directory(entry.to_string()));
        }
        Ok(Self(entry))
    }

    pub fn entry(&self) -> &Entry {
        &self.0
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }

    /// Direct children, sorted by name.
    pub fn children(&self) -> VfsResult<Vec<Entry>> {
        let vfs = self.0.vfs();
        Ok(vfs
            .readdir(self.path())?
            .into_iter()
            .map(|child| Entry::new(vfs.clone(), self.path().join(&child.name), child.kind))
            .collect())
    }

    /// Every descendant, depth-first pre-order: a subdirectory is listed
    /// right before its own contents. Symlinks are never followed.
    pub fn descendants(&self) -> VfsResult<Vec<Entry>> {
        let mut out = Vec::new();
        self.walk_into(&mut out)?;
        Ok(out)
    }

    fn walk_into(&self, out: &mut Vec<Entry>) -> VfsResult<()> {
        for child in self.children()? {
            let sub = child.as_dir();
            out.push(child);
            if let Some(sub) = sub {
                sub.walk_into(out)?;
            }
        }
        Ok(())
    }
}

impl From<Dir> for Entry {
    fn from(dir: Dir) -> Self {
        dir.0
    }
}
