//! rush command-line front end.
//!
//! ```bash
//! rush search 'TODO|FIXME' src            # every line matching, grep-style
//! rush search localhost /etc/hosts --json
//! rush replace 'old_name' 'new_name' 'src/**/*.rs'
//! rush count src tests
//! rush tools                              # which editors were found
//! rush run vim src/main.rs src/lib.rs -- -p
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

mod target;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use rush_kernel::{
    Commands, LocalBackend, RushConfig, SearchResults, ShellRunner, ToolRegistry, ToolStatus,
    VfsOps,
};
use tracing_subscriber::{EnvFilter, fmt};

/// Search, rewrite and open files, directories and globs alike.
#[derive(Parser, Debug)]
#[command(name = "rush", version)]
#[command(about = "Polymorphic file commands: search, replace, count, and open in editors")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/rush/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every line matching a regex
    Search {
        pattern: String,
        #[arg(required = true)]
        paths: Vec<String>,
        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace every regex match in place
    Replace {
        pattern: String,
        replacement: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Count lines across all files
    Count {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List probed external tools
    Tools,
    /// Open all files in an external tool with a single invocation
    Run {
        tool: String,
        #[arg(required = true)]
        paths: Vec<String>,
        /// Extra arguments passed to the tool, after `--`
        #[arg(last = true)]
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rush: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    // Only replace needs to write.
    let backend = if matches!(args.command, Command::Replace { .. }) {
        LocalBackend::new("/")
    } else {
        LocalBackend::read_only("/")
    };
    let vfs: Arc<dyn VfsOps> = Arc::new(backend);
    let cwd = std::env::current_dir().context("cannot determine working directory")?;

    match args.command {
        Command::Search {
            pattern,
            paths,
            json,
        } => {
            let pattern = compile(&pattern)?;
            let target = target::resolve(vfs, &cwd, &paths)?;
            let results = target.search(&pattern)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }
        Command::Replace {
            pattern,
            replacement,
            paths,
        } => {
            let pattern = compile(&pattern)?;
            let target = target::resolve(vfs, &cwd, &paths)?;
            target.replace_contents(&pattern, &replacement)?;
        }
        Command::Count { paths } => {
            let target = target::resolve(vfs, &cwd, &paths)?;
            println!("{}", target.line_count()?);
        }
        Command::Tools => {
            for info in registry(&config).list() {
                let status = match info.status {
                    ToolStatus::Available => "available",
                    ToolStatus::Unavailable => "not found",
                };
                println!("{:<12} {}", info.name, status);
            }
        }
        Command::Run { tool, paths, args } => {
            let registry = registry(&config);
            let target = target::resolve(vfs, &cwd, &paths)?;
            let result = registry.invoke(&tool, &*target, args.as_slice())?;
            return Ok(match result.exit_code {
                Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
                None => ExitCode::FAILURE,
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(explicit: Option<&Path>) -> Result<RushConfig> {
    let config = match explicit {
        Some(path) => RushConfig::load(path)?,
        None => RushConfig::load_default()?,
    };
    Ok(config)
}

fn registry(config: &RushConfig) -> &'static ToolRegistry {
    let runner = Arc::new(ShellRunner::new(config.tools.shell.clone()));
    ToolRegistry::init_global(&config.tools, runner)
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid pattern {pattern:?}"))
}

/// grep-style rows with host paths, then the summary on stderr.
fn print_results(results: &SearchResults) {
    for m in results {
        let path = m.entry.full_path();
        for line in &m.lines {
            println!("{}:{}:{}", path.display(), line.line_number, line.line);
        }
    }
    for skipped in results.skipped() {
        eprintln!("rush: skipped {}: {}", skipped.entry.full_path().display(), skipped.reason);
    }
    eprintln!("{}", results.summary());
}
