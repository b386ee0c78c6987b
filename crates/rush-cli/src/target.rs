//! Turning command-line path arguments into a consumer.
//!
//! The backend is a [`LocalBackend`](rush_kernel::LocalBackend) rooted at
//! `/`, so every argument is made absolute against the working directory
//! and then addressed relative to that root.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rush_kernel::{Consumer, Entry, EntryList, VfsOps, has_glob_meta};

/// Map a user-supplied path to a backend path relative to `/`.
///
/// Expands `~`, resolves against `cwd`, and folds `.` and `..` lexically.
/// Glob metacharacters pass through untouched.
pub fn backend_path(raw: &str, cwd: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let absolute = cwd.join(expanded.as_ref());

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Normal(name) => out.push(name),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Build the consumer a command operates on.
///
/// One literal path is a single entry. Several paths, or any glob pattern,
/// make a collection in argument order.
pub fn resolve(vfs: Arc<dyn VfsOps>, cwd: &Path, raw_paths: &[String]) -> Result<Box<dyn Consumer>> {
    match raw_paths {
        [] => bail!("no paths given"),
        [raw] if !has_glob_meta(raw) => Ok(Box::new(open(vfs, cwd, raw)?)),
        _ => {
            let mut list = EntryList::new();
            for raw in raw_paths {
                if has_glob_meta(raw) {
                    let pattern = backend_path(raw, cwd);
                    let matched = EntryList::glob(vfs.clone(), &pattern.to_string_lossy())
                        .with_context(|| format!("cannot expand {raw}"))?;
                    if matched.is_empty() {
                        tracing::warn!(pattern = %raw, "glob matched nothing");
                    }
                    list.extend(matched);
                } else {
                    list.push(open(vfs.clone(), cwd, raw)?);
                }
            }
            Ok(Box::new(list))
        }
    }
}

fn open(vfs: Arc<dyn VfsOps>, cwd: &Path, raw: &str) -> Result<Entry> {
    Entry::open(vfs, backend_path(raw, cwd)).with_context(|| format!("cannot open {raw}"))
}
