//! External tool registry and dispatch.
//!
//! At startup the registry probes a configured list of candidate programs
//! (`vim`, `mate` by default) by running `<tool> --version` with output
//! suppressed. Tools whose probe exits successfully become invocable
//! against any [`Consumer`]: all resolved paths are quoted, joined, and
//! handed to the tool in a single shell invocation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rush_kernel::{Dir, LocalBackend, RushConfig, ShellRunner, ToolDispatch, ToolRegistry};
//!
//! let config = RushConfig::default();
//! let registry = ToolRegistry::init_global(&config.tools, Arc::new(ShellRunner::default()));
//!
//! let src = Dir::open(Arc::new(LocalBackend::new("/")), "home/amy/src").unwrap();
//! if registry.is_available("vim") {
//!     let status = src.run_tool(registry, "vim", &["-p"]).unwrap();
//!     println!("vim exited with {:?}", status.exit_code);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::config::ToolsConfig;
use crate::consumer::Consumer;
use crate::entry::Entry;
use crate::vfs::VfsError;

// ============================================================================
// Process runner
// ============================================================================

/// Where a child process's stdio goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Share the caller's terminal (interactive tools).
    Inherit,
    /// Discard all output and give the child no stdin (probes).
    Suppress,
}

/// Exit status of a finished command. Output is never captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether execution succeeded.
    pub success: bool,
}

impl ExecResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
        }
    }

    /// Create a failure result. Always unsuccessful, whatever the code.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: false,
        }
    }

    /// Result of a process that exited normally with `exit_code`.
    pub fn from_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

impl From<ExitStatus> for ExecResult {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Self::from_code(code),
            // Killed by a signal.
            None => Self {
                exit_code: None,
                success: false,
            },
        }
    }
}

/// Runs shell command lines, blocking until they exit.
pub trait ProcessRunner: Send + Sync {
    /// Run `command_line` and wait for it.
    ///
    /// `Err` means the command could not be started at all; a command that
    /// ran and failed is an `Ok` with `success == false`.
    fn run(&self, command_line: &str, output: OutputMode) -> io::Result<ExecResult>;
}

/// Runs command lines through `<shell> -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, command_line: &str, output: OutputMode) -> io::Result<ExecResult> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command_line);
        if output == OutputMode::Suppress {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
        let status = cmd.status()?;
        Ok(status.into())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Probe outcome for one candidate tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Available,
    Unavailable,
}

/// Information about a candidate tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name, also the command that gets run.
    pub name: String,
    /// Result of the startup probe.
    pub status: ToolStatus,
}

impl ToolInfo {
    pub fn is_available(&self) -> bool {
        self.status == ToolStatus::Available
    }
}

/// Tool dispatch errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool was not found by the startup probe, or was never a candidate.
    #[error("no such tool: {0}")]
    Unavailable(String),

    /// The target could not be resolved into entries.
    #[error("failed to resolve entries for {tool}: {source}")]
    Resolution {
        tool: String,
        #[source]
        source: VfsError,
    },

    /// The shell could not be started.
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
}

static GLOBAL: OnceLock<ToolRegistry> = OnceLock::new();

/// Probed table of external tools.
///
/// Each candidate is probed exactly once, when the registry is built.
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolInfo>,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Probe every candidate in `config` and build the registry.
    #[tracing::instrument(skip_all, fields(candidates = config.candidates.len()))]
    pub fn probe(config: &ToolsConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let mut tools = BTreeMap::new();
        for name in &config.candidates {
            if tools.contains_key(name) {
                continue;
            }
            let status = probe_one(runner.as_ref(), name, &config.probe_arg);
            tools.insert(
                name.clone(),
                ToolInfo {
                    name: name.clone(),
                    status,
                },
            );
        }

        let registry = Self { tools, runner };
        tracing::info!(
            available = ?registry.available_tools(),
            "external tools probed"
        );
        registry
    }

    /// Build the process-wide registry on first call; later calls return
    /// the same registry without probing again.
    pub fn init_global(config: &ToolsConfig, runner: Arc<dyn ProcessRunner>) -> &'static Self {
        GLOBAL.get_or_init(|| Self::probe(config, runner))
    }

    /// The process-wide registry, if [`init_global`](Self::init_global) ran.
    pub fn global() -> Option<&'static Self> {
        GLOBAL.get()
    }

    /// Names of the tools that passed the probe.
    pub fn available_tools(&self) -> BTreeSet<String> {
        self.tools
            .values()
            .filter(|t| t.is_available())
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Info for an available tool.
    pub fn get(&self, name: &str) -> Option<&ToolInfo> {
        self.tools.get(name).filter(|t| t.is_available())
    }

    /// Every probed candidate, available or not, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = &ToolInfo> {
        self.tools.values()
    }

    /// The shell command line `invoke` would run.
    ///
    /// The quoted path of every resolved entry, directories included, is
    /// joined with spaces; `extra_args` follow verbatim, so they may carry
    /// shell syntax.
    pub fn command_line<C, S>(
        &self,
        name: &str,
        consumer: &C,
        extra_args: &[S],
    ) -> Result<String, ToolError>
    where
        C: Consumer + ?Sized,
        S: AsRef<str>,
    {
        let info = self
            .get(name)
            .ok_or_else(|| ToolError::Unavailable(name.to_string()))?;

        let entries = consumer.entries().map_err(|source| ToolError::Resolution {
            tool: name.to_string(),
            source,
        })?;

        let mut parts = vec![info.name.clone()];
        parts.extend(entries.iter().map(Entry::quoted_path));
        parts.extend(extra_args.iter().map(|a| a.as_ref().to_string()));
        Ok(parts.join(" "))
    }

    /// Run tool `name` once against every resolved entry of `consumer`.
    ///
    /// The tool's exit status is returned as-is; a non-zero exit is not an
    /// error.
    #[tracing::instrument(skip(self, consumer, extra_args))]
    pub fn invoke<C, S>(
        &self,
        name: &str,
        consumer: &C,
        extra_args: &[S],
    ) -> Result<ExecResult, ToolError>
    where
        C: Consumer + ?Sized,
        S: AsRef<str>,
    {
        let line = self.command_line(name, consumer, extra_args)?;
        tracing::debug!(command = %line, "invoking external tool");

        let result = self
            .runner
            .run(&line, OutputMode::Inherit)
            .map_err(|source| ToolError::Spawn {
                tool: name.to_string(),
                source,
            })?;
        if !result.success {
            tracing::debug!(exit_code = ?result.exit_code, "external tool exited unsuccessfully");
        }
        Ok(result)
    }
}

fn probe_one(runner: &dyn ProcessRunner, name: &str, probe_arg: &str) -> ToolStatus {
    let line = if probe_arg.is_empty() {
        name.to_string()
    } else {
        format!("{name} {probe_arg}")
    };
    match runner.run(&line, OutputMode::Suppress) {
        Ok(result) if result.success => ToolStatus::Available,
        Ok(result) => {
            tracing::debug!(tool = name, exit_code = ?result.exit_code, "tool probe failed");
            ToolStatus::Unavailable
        }
        Err(e) => {
            tracing::warn!(tool = name, error = %e, "tool probe could not run");
            ToolStatus::Unavailable
        }
    }
}

/// Tool invocation as a method on consumers.
pub trait ToolDispatch: Consumer {
    /// `registry.invoke(name, self, extra_args)`.
    fn run_tool<S: AsRef<str>>(
        &self,
        registry: &ToolRegistry,
        name: &str,
        extra_args: &[S],
    ) -> Result<ExecResult, ToolError> {
        registry.invoke(name, self, extra_args)
    }
}

impl<T: Consumer + ?Sized> ToolDispatch for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::EntryList;
    use crate::entry::{Dir, Entry};
    use crate::vfs::{MemoryBackend, VfsOps};
    use parking_lot::Mutex;

    /// Records every command line; tools listed in `installed` succeed.
    struct FakeRunner {
        installed: Vec<&'static str>,
        exit_code: i32,
        calls: Mutex<Vec<(String, OutputMode)>>,
    }

    impl FakeRunner {
        fn new(installed: Vec<&'static str>) -> Self {
            Self {
                installed,
                exit_code: 0,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, OutputMode)> {
            self.calls.lock().clone()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, command_line: &str, output: OutputMode) -> io::Result<ExecResult> {
            self.calls.lock().push((command_line.to_string(), output));
            let program = command_line.split(' ').next().unwrap_or_default();
            if !self.installed.contains(&program) {
                return Ok(ExecResult::failure(127));
            }
            if output == OutputMode::Suppress {
                Ok(ExecResult::success())
            } else {
                Ok(ExecResult::from_code(self.exit_code))
            }
        }
    }

    /// A runner that can never start anything.
    struct BrokenRunner;

    impl ProcessRunner for BrokenRunner {
        fn run(&self, _: &str, _: OutputMode) -> io::Result<ExecResult> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no shell"))
        }
    }

    fn config(candidates: &[&str]) -> ToolsConfig {
        ToolsConfig::default().with_candidates(candidates.iter().copied())
    }

    fn fixture() -> Arc<dyn VfsOps> {
        let fs = MemoryBackend::new();
        fs.insert_file("src/main.rs", "fn main() {}\n").unwrap();
        fs.insert_file("src/lib/mod.rs", "\n").unwrap();
        fs.insert_file("notes/my file.txt", "x\n").unwrap();
        Arc::new(fs)
    }

    #[test]
    fn test_probe_registers_only_installed_tools() {
        let runner = Arc::new(FakeRunner::new(vec!["vim"]));
        let registry = ToolRegistry::probe(&config(&["vim", "mate"]), runner.clone());

        assert_eq!(
            registry.available_tools(),
            BTreeSet::from(["vim".to_string()])
        );
        assert!(registry.is_available("vim"));
        assert!(!registry.is_available("mate"));
        assert!(registry.get("mate").is_none());
        assert_eq!(registry.list().count(), 2);

        assert_eq!(
            runner.calls(),
            vec![
                ("vim --version".to_string(), OutputMode::Suppress),
                ("mate --version".to_string(), OutputMode::Suppress),
            ]
        );
    }

    #[test]
    fn test_probe_spawn_failure_means_unavailable() {
        let registry = ToolRegistry::probe(&config(&["vim"]), Arc::new(BrokenRunner));
        assert!(registry.available_tools().is_empty());
    }

    #[test]
    fn test_duplicate_candidates_probed_once() {
        let runner = Arc::new(FakeRunner::new(vec!["vim"]));
        ToolRegistry::probe(&config(&["vim", "vim"]), runner.clone());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_invoke_batches_all_paths() {
        let runner = Arc::new(FakeRunner::new(vec!["vim"]));
        let registry = ToolRegistry::probe(&config(&["vim"]), runner.clone());
        let vfs = fixture();
        let src = Dir::open(vfs.clone(), "src").unwrap();
        let note = Entry::open(vfs, "notes/my file.txt").unwrap();
        let list: EntryList = vec![src.into(), note].into();

        let result = registry.invoke("vim", &list, &["-p", "+10"]).unwrap();
        assert!(result.success);

        let (line, mode) = runner.calls().pop().unwrap();
        assert_eq!(mode, OutputMode::Inherit);
        assert_eq!(
            shlex::split(&line).unwrap(),
            vec![
                "vim",
                "src/lib",
                "src/lib/mod.rs",
                "src/main.rs",
                "notes/my file.txt",
                "-p",
                "+10"
            ]
        );
    }

    #[test]
    fn test_command_line_keeps_directories() {
        let fs = MemoryBackend::new();
        fs.insert_file("d/sub/x.txt", "x\n").unwrap();
        let vfs: Arc<dyn VfsOps> = Arc::new(fs);
        let registry =
            ToolRegistry::probe(&config(&["vim"]), Arc::new(FakeRunner::new(vec!["vim"])));

        let d = Dir::open(vfs, "d").unwrap();
        let line = registry.command_line("vim", &d, &["-p"]).unwrap();
        assert_eq!(
            shlex::split(&line).unwrap(),
            vec!["vim", "d/sub", "d/sub/x.txt", "-p"]
        );
    }

    #[test]
    fn test_exec_result_constructors() {
        assert!(ExecResult::success().success);
        assert!(!ExecResult::failure(0).success);
        assert!(!ExecResult::failure(2).success);
        assert_eq!(ExecResult::from_code(0), ExecResult::success());
        assert_eq!(ExecResult::from_code(4), ExecResult::failure(4));
    }

    #[test]
    fn test_command_line_without_extra_args() {
        let registry =
            ToolRegistry::probe(&config(&["vim"]), Arc::new(FakeRunner::new(vec!["vim"])));
        let main = Entry::open(fixture(), "src/main.rs").unwrap();
        let no_args: &[&str] = &[];
        assert_eq!(
            registry.command_line("vim", &main, no_args).unwrap(),
            format!("vim {}", main.quoted_path())
        );
    }

    #[test]
    fn test_unregistered_tool_fails_distinctly() {
        let mut runner = FakeRunner::new(vec!["vim"]);
        runner.exit_code = 3;
        let registry = ToolRegistry::probe(&config(&["vim", "mate"]), Arc::new(runner));
        let main = Entry::open(fixture(), "src/main.rs").unwrap();
        let no_args: &[&str] = &[];

        assert!(matches!(
            registry.invoke("mate", &main, no_args),
            Err(ToolError::Unavailable(name)) if name == "mate"
        ));
        assert!(matches!(
            registry.invoke("emacs", &main, no_args),
            Err(ToolError::Unavailable(_))
        ));

        let failed = main.run_tool(&registry, "vim", no_args).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(3));
    }

    #[test]
    fn test_invoke_resolution_error() {
        let registry =
            ToolRegistry::probe(&config(&["vim"]), Arc::new(FakeRunner::new(vec!["vim"])));
        let ghost = Entry::new(
            Arc::new(MemoryBackend::new()),
            "ghost",
            crate::vfs::FileType::Directory,
        );
        assert!(matches!(
            ghost.run_tool(&registry, "vim", &["x"]),
            Err(ToolError::Resolution { .. })
        ));
    }

    #[test]
    fn test_shell_runner_reports_exit_status() {
        let runner = ShellRunner::default();
        assert!(runner.run("true", OutputMode::Suppress).unwrap().success);

        let failed = runner.run("exit 7", OutputMode::Suppress).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(7));
    }

    #[test]
    fn test_shell_runner_missing_shell() {
        let runner = ShellRunner::new("/nonexistent/shell");
        assert!(runner.run("true", OutputMode::Suppress).is_err());
    }

    #[test]
    fn test_real_probe_of_missing_tool() {
        let registry = ToolRegistry::probe(
            &config(&["definitely-not-a-real-tool-4f9a"]),
            Arc::new(ShellRunner::default()),
        );
        assert!(registry.available_tools().is_empty());
    }
}
