//! Content commands that work on any [`Consumer`].
//!
//! Every command follows the same shape: resolve the target into entries,
//! skip containers, apply a per-entry action, aggregate. The
//! [`Commands`] trait is implemented for every consumer, so the same
//! call works on a single file, a whole directory, or a list of entries:
//!
//! ```no_run
//! use std::sync::Arc;
//! use regex::Regex;
//! use rush_kernel::{Commands, Dir, EntryList, LocalBackend, VfsOps};
//!
//! let vfs: Arc<dyn VfsOps> = Arc::new(LocalBackend::new("/"));
//! let localhost = Regex::new("localhost").unwrap();
//!
//! let etc = Dir::open(vfs.clone(), "etc").unwrap();
//! println!("{}", etc.search(&localhost).unwrap());
//!
//! let confs = EntryList::glob(vfs, "etc/**/*.conf").unwrap();
//! println!("{} lines", confs.line_count().unwrap());
//! ```

use regex::Regex;
use thiserror::Error;

use crate::consumer::Consumer;
use crate::entry::Entry;
use crate::search_results::SearchResults;
use crate::vfs::VfsError;

/// Errors from content commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The target could not be resolved into entries.
    #[error("failed to resolve entries: {0}")]
    Resolution(#[source] VfsError),

    /// An entry's content could not be read or rewritten.
    #[error("failed to access {path}: {source}")]
    ContentAccess {
        path: String,
        #[source]
        source: VfsError,
    },
}

impl CommandError {
    fn content(entry: &Entry, source: VfsError) -> Self {
        Self::ContentAccess {
            path: entry.to_string(),
            source,
        }
    }
}

/// Command result type.
pub type CommandResult<T> = Result<T, CommandError>;

/// Resolve `consumer` and keep only the entries that carry content.
fn content_entries<C: Consumer + ?Sized>(consumer: &C) -> CommandResult<Vec<Entry>> {
    let mut entries = consumer.entries().map_err(CommandError::Resolution)?;
    entries.retain(Entry::has_content);
    Ok(entries)
}

/// Search, replace and count over any [`Consumer`].
///
/// Read-only commands are best-effort: an entry whose content cannot be
/// read is logged and skipped. `replace_contents` stops at the first entry
/// it cannot rewrite; entries rewritten before that stay rewritten.
pub trait Commands: Consumer {
    /// Lines matching `pattern`, grouped by entry in resolution order.
    #[tracing::instrument(skip_all, fields(pattern = %pattern))]
    fn search(&self, pattern: &Regex) -> CommandResult<SearchResults> {
        let mut results = SearchResults::new(pattern.clone());
        for entry in content_entries(self)? {
            match entry.search(pattern) {
                Ok(lines) => results.add(entry, lines),
                Err(e) => {
                    tracing::warn!(path = %entry, error = %e, "skipping unreadable entry");
                    results.skip(entry, e.to_string());
                }
            }
        }
        tracing::debug!(
            entries = results.len(),
            matches = results.match_count(),
            "search complete"
        );
        Ok(results)
    }

    /// Replace every match of `pattern` with `with` in every content entry.
    #[tracing::instrument(skip_all, fields(pattern = %pattern))]
    fn replace_contents(&self, pattern: &Regex, with: &str) -> CommandResult<()> {
        let mut rewritten = 0usize;
        for entry in content_entries(self)? {
            let changed = entry
                .replace_contents(pattern, with)
                .map_err(|e| CommandError::content(&entry, e))?;
            if changed {
                tracing::debug!(path = %entry, "rewrote entry");
                rewritten += 1;
            }
        }
        tracing::debug!(rewritten, "replace complete");
        Ok(())
    }

    /// Total number of lines across all content entries.
    #[tracing::instrument(skip_all)]
    fn line_count(&self) -> CommandResult<usize> {
        let mut total = 0;
        for entry in content_entries(self)? {
            match entry.lines() {
                Ok(lines) => total += lines.len(),
                Err(e) => {
                    tracing::warn!(path = %entry, error = %e, "skipping unreadable entry");
                }
            }
        }
        Ok(total)
    }
}

impl<T: Consumer + ?Sized> Commands for T {}
