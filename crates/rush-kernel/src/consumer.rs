//! Entry resolution: flattening a target into the entries it stands for.
//!
//! Three shapes implement [`Consumer`]:
//!
//! - a single [`Entry`] resolves to itself, or to its descendants when it
//!   is a directory
//! - a [`Dir`] resolves to its descendants
//! - a collection ([`EntryList`], or any `[Entry]`) resolves to the
//!   concatenation of its members' resolutions
//!
//! Resolution never deduplicates or filters. Content operations skip the
//! container entries themselves.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};

use crate::entry::{Dir, Entry};
use crate::vfs::{VfsError, VfsOps, VfsResult};

/// Anything the command layer can operate on.
pub trait Consumer {
    /// The ordered entry sequence this target stands for.
    fn entries(&self) -> VfsResult<Vec<Entry>>;
}

impl Consumer for Entry {
    fn entries(&self) -> VfsResult<Vec<Entry>> {
        match self.as_dir() {
            Some(dir) => dir.descendants(),
            None => Ok(vec![self.clone()]),
        }
    }
}

impl Consumer for Dir {
    fn entries(&self) -> VfsResult<Vec<Entry>> {
        self.descendants()
    }
}

impl Consumer for [Entry] {
    fn entries(&self) -> VfsResult<Vec<Entry>> {
        let mut out = Vec::with_capacity(self.len());
        for member in self {
            out.extend(member.entries()?);
        }
        Ok(out)
    }
}

/// An ordered, hand-built or glob-built collection of entries.
///
/// Members may come from different backends. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryList {
    members: Vec<Entry>,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<Entry>) {
        self.members.push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.members.iter()
    }

    pub fn as_slice(&self) -> &[Entry] {
        &self.members
    }

    /// Collect every path on `vfs` matching a glob such as `etc/**/*.conf`.
    ///
    /// `*` and `?` stop at `/`; `**` crosses directories. The walk starts at
    /// the pattern's literal prefix, so `src/**/*.rs` only lists `src`. A
    /// pattern without metacharacters names a single path and yields it
    /// when it exists.
    ///
    /// A matched directory becomes one member and its subtree is not
    /// searched further: resolution expands it, so its files would
    /// otherwise show up twice.
    pub fn glob(vfs: Arc<dyn VfsOps>, pattern: &str) -> VfsResult<Self> {
        let pattern = normalize_pattern(pattern);
        let mut list = Self::new();

        if !has_glob_meta(&pattern) {
            match Entry::open(vfs, &pattern) {
                Ok(entry) => list.push(entry),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            return Ok(list);
        }

        let matcher = compile_glob(&pattern)?;
        let prefix = static_prefix(&pattern);
        let root = match Entry::open(vfs, &prefix) {
            Ok(root) => root,
            Err(e) if e.is_not_found() => return Ok(list),
            Err(e) => return Err(e),
        };
        let Some(root) = root.as_dir() else {
            return Ok(list);
        };

        collect_matches(&root, &matcher, &mut list)?;
        tracing::debug!(pattern = %pattern, matches = list.len(), "glob expanded");
        Ok(list)
    }
}

impl Consumer for EntryList {
    fn entries(&self) -> VfsResult<Vec<Entry>> {
        self.members.entries()
    }
}

impl From<Vec<Entry>> for EntryList {
    fn from(members: Vec<Entry>) -> Self {
        Self { members }
    }
}

impl FromIterator<Entry> for EntryList {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl Extend<Entry> for EntryList {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl IntoIterator for EntryList {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Pre-order walk below `dir`, pushing matches and pruning at matched
/// directories.
fn collect_matches(dir: &Dir, matcher: &GlobMatcher, out: &mut EntryList) -> VfsResult<()> {
    for child in dir.children()? {
        let matched = matcher.is_match(child.path());
        match child.as_dir() {
            Some(_) if matched => out.push(child),
            Some(sub) => collect_matches(&sub, matcher, out)?,
            None if matched => out.push(child),
            None => {}
        }
    }
    Ok(())
}

/// True when `s` contains glob metacharacters.
pub fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Strip the leading `/` and `./` so patterns line up with VFS paths.
fn normalize_pattern(pattern: &str) -> String {
    let mut p = pattern;
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest;
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest;
        } else {
            break;
        }
    }
    p.to_string()
}

fn compile_glob(pattern: &str) -> VfsResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| VfsError::invalid_path(format!("{pattern}: {e}")))
}

/// Leading path components that contain no metacharacters.
fn static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();
    // The last component is always part of the match, never the walk root.
    for component in components.iter().take(components.len().saturating_sub(1)) {
        let Component::Normal(part) = component else {
            continue;
        };
        if has_glob_meta(&part.to_string_lossy()) {
            break;
        }
        prefix.push(part);
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryBackend;

    fn fixture() -> Arc<dyn VfsOps> {
        let fs = MemoryBackend::new();
        fs.insert_file("etc/hosts", "127.0.0.1 localhost\n").unwrap();
        fs.insert_file("etc/app.conf", "port=80\n").unwrap();
        fs.insert_file("etc/conf.d/net.conf", "iface eth0\n").unwrap();
        fs.insert_file("etc/conf.d/deep/x.conf", "x\n").unwrap();
        fs.insert_file("home/readme", "hi\n").unwrap();
        Arc::new(fs)
    }

    fn paths(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_file_resolves_to_itself() {
        let hosts = Entry::open(fixture(), "etc/hosts").unwrap();
        assert_eq!(hosts.entries().unwrap(), vec![hosts]);
    }

    #[test]
    fn test_dir_entry_resolves_to_descendants() {
        let vfs = fixture();
        let entry = Entry::open(vfs.clone(), "etc/conf.d").unwrap();
        let dir = Dir::open(vfs, "etc/conf.d").unwrap();
        assert_eq!(entry.entries().unwrap(), dir.entries().unwrap());
        assert_eq!(
            paths(&dir.entries().unwrap()),
            vec![
                "etc/conf.d/deep",
                "etc/conf.d/deep/x.conf",
                "etc/conf.d/net.conf"
            ]
        );
    }

    #[test]
    fn test_collection_concatenates_and_keeps_duplicates() {
        let vfs = fixture();
        let hosts = Entry::open(vfs.clone(), "etc/hosts").unwrap();
        let home = Entry::open(vfs, "home").unwrap();
        let list: EntryList = vec![hosts.clone(), home, hosts].into();

        assert_eq!(
            paths(&list.entries().unwrap()),
            vec!["etc/hosts", "home/readme", "etc/hosts"]
        );
    }

    #[test]
    fn test_slice_is_a_consumer() {
        let vfs = fixture();
        let members = vec![Entry::open(vfs, "home/readme").unwrap()];
        assert_eq!(members.entries().unwrap().len(), 1);
        assert!(Vec::<Entry>::new().entries().unwrap().is_empty());
    }

    #[test]
    fn test_vanished_member_fails_resolution() {
        let fs = Arc::new(MemoryBackend::new());
        let ghost = Entry::new(fs, "gone", crate::vfs::FileType::Directory);
        assert!(ghost.entries().unwrap_err().is_not_found());
    }

    #[test]
    fn test_glob_recursive() {
        let list = EntryList::glob(fixture(), "/etc/**/*.conf").unwrap();
        assert_eq!(
            paths(list.as_slice()),
            vec![
                "etc/app.conf",
                "etc/conf.d/deep/x.conf",
                "etc/conf.d/net.conf"
            ]
        );
    }

    #[test]
    fn test_glob_matched_directory_is_not_walked_twice() {
        let list = EntryList::glob(fixture(), "etc/**").unwrap();
        assert_eq!(
            paths(list.as_slice()),
            vec!["etc/app.conf", "etc/conf.d", "etc/hosts"]
        );

        let resolved = paths(&list.entries().unwrap());
        assert_eq!(
            resolved,
            vec![
                "etc/app.conf",
                "etc/conf.d",
                "etc/conf.d/deep",
                "etc/conf.d/deep/x.conf",
                "etc/conf.d/net.conf",
                "etc/hosts"
            ]
        );
    }

    #[test]
    fn test_glob_star_stops_at_separator() {
        let list = EntryList::glob(fixture(), "etc/*.conf").unwrap();
        assert_eq!(paths(list.as_slice()), vec!["etc/app.conf"]);
    }

    #[test]
    fn test_glob_literal_and_missing() {
        let vfs = fixture();
        assert_eq!(EntryList::glob(vfs.clone(), "etc/hosts").unwrap().len(), 1);
        assert!(EntryList::glob(vfs.clone(), "etc/nope").unwrap().is_empty());
        assert!(EntryList::glob(vfs, "var/**/*.log").unwrap().is_empty());
    }

    #[test]
    fn test_glob_invalid_pattern() {
        assert!(matches!(
            EntryList::glob(fixture(), "etc/[*.conf"),
            Err(VfsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_static_prefix() {
        assert_eq!(static_prefix("etc/**/*.conf"), PathBuf::from("etc"));
        assert_eq!(static_prefix("*.rs"), PathBuf::new());
        assert_eq!(static_prefix("a/b/c*/d"), PathBuf::from("a/b"));
    }
}
