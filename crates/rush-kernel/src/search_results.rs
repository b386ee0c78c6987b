//! Result set produced by [`Commands::search`](crate::Commands::search).

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::entry::{Entry, LineMatch};

/// Matching lines of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMatches {
    pub entry: Entry,
    pub lines: Vec<LineMatch>,
}

/// An entry whose content could not be searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub entry: Entry,
    pub reason: String,
}

/// The pattern plus every entry that matched it, in resolution order.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    #[serde(serialize_with = "serialize_pattern")]
    pattern: Regex,
    matches: Vec<EntryMatches>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedEntry>,
}

fn serialize_pattern<S: Serializer>(pattern: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(pattern.as_str())
}

impl SearchResults {
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            matches: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Record an entry's matches. Entries without matches are not recorded.
    pub fn add(&mut self, entry: Entry, lines: Vec<LineMatch>) {
        if !lines.is_empty() {
            self.matches.push(EntryMatches { entry, lines });
        }
    }

    /// Record an entry that was skipped because its content was unreadable.
    pub fn skip(&mut self, entry: Entry, reason: impl Into<String>) {
        self.skipped.push(SkippedEntry {
            entry,
            reason: reason.into(),
        });
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Matching entries, in resolution order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.matches.iter().map(|m| &m.entry)
    }

    /// Every matching line across all entries.
    pub fn lines(&self) -> impl Iterator<Item = &LineMatch> {
        self.matches.iter().flat_map(|m| m.lines.iter())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntryMatches> {
        self.matches.iter()
    }

    /// Matches for one entry, if it matched.
    pub fn get(&self, entry: &Entry) -> Option<&[LineMatch]> {
        self.matches
            .iter()
            .find(|m| &m.entry == entry)
            .map(|m| m.lines.as_slice())
    }

    /// Number of matching entries.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of matching lines across all entries.
    pub fn match_count(&self) -> usize {
        self.matches.iter().map(|m| m.lines.len()).sum()
    }

    /// `N matches in M files`, or `No matches found.`
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No matches found.".to_string();
        }
        let total = self.match_count();
        let files = self.len();
        format!(
            "{total} match{} in {files} file{}",
            if total == 1 { "" } else { "es" },
            if files == 1 { "" } else { "s" },
        )
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a EntryMatches;
    type IntoIter = std::slice::Iter<'a, EntryMatches>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// grep-style `path:line:text` rows followed by a summary line.
impl fmt::Display for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.matches {
            for line in &m.lines {
                writeln!(f, "{}:{}:{}", m.entry, line.line_number, line.line)?;
            }
        }

        write!(f, "{}", self.summary())
    }
}
