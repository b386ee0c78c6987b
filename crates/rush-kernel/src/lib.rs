//! # rush-kernel
//!
//! Filesystem command layer for rush.
//!
//! Every command operates on a *consumer*: a single entry, a directory, or
//! a collection of entries. Before doing any work a command resolves its
//! consumer into a flat, ordered list of entries (directories expand to
//! all their descendants), so the same call works the same way on one file,
//! a whole tree, or a glob result.
//!
//! - [`vfs`]: backend abstraction with local and in-memory backends
//! - [`Entry`] / [`Dir`]: handles to files and directories
//! - [`Consumer`] / [`EntryList`]: resolution into entry sequences
//! - [`Commands`]: search, replace and line counting on any consumer
//! - [`ToolRegistry`]: probing and launching external tools (editors)
//! - [`RushConfig`]: user configuration

pub mod commands;
pub mod config;
pub mod consumer;
pub mod entry;
pub mod search_results;
pub mod tools;
pub mod vfs;

pub use commands::{CommandError, CommandResult, Commands};
pub use config::{ConfigError, RushConfig, ToolsConfig};
pub use consumer::{Consumer, EntryList, has_glob_meta};
pub use entry::{Dir, Entry, LineMatch};
pub use search_results::{EntryMatches, SearchResults, SkippedEntry};
pub use tools::{
    ExecResult, OutputMode, ProcessRunner, ShellRunner, ToolDispatch, ToolError, ToolInfo,
    ToolRegistry, ToolStatus,
};
pub use vfs::{
    DirEntry, FileAttr, FileType, VfsError, VfsOps, VfsResult,
    backends::{LocalBackend, MemoryBackend},
};
