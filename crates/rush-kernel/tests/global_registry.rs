//! The process-wide registry. Kept in its own test binary because the
//! registry lives in a `OnceLock` shared by every test in the process.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rush_kernel::{ExecResult, OutputMode, ProcessRunner, ToolRegistry, ToolsConfig};

/// Counts probes; every tool it is asked about exists.
#[derive(Default)]
struct CountingRunner {
    runs: AtomicUsize,
}

impl ProcessRunner for CountingRunner {
    fn run(&self, _command_line: &str, _output: OutputMode) -> io::Result<ExecResult> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(ExecResult::success())
    }
}

#[test]
fn init_global_probes_exactly_once() {
    assert!(ToolRegistry::global().is_none());

    let runner = Arc::new(CountingRunner::default());
    let vim = ToolsConfig::default().with_candidates(["vim"]);
    let mate = ToolsConfig::default().with_candidates(["mate"]);

    let first = ToolRegistry::init_global(&vim, runner.clone());
    let second = ToolRegistry::init_global(&mate, runner.clone());

    assert!(std::ptr::eq(first, second));
    assert!(ToolRegistry::global().is_some_and(|g| std::ptr::eq(g, first)));
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
    assert!(first.is_available("vim"));
    assert!(!first.is_available("mate"));
}
