//! Command-line interface for lintgate
//!
//! One invocation is one gate run: resolve the files, check them in
//! parallel, print the report and return the exit code.

use crate::check::{
    ExternalChecker, Orchestrator, ReportFormat, Reporter, ToolAvailability, decide, exit_code,
};
use crate::config::LintgateConfig;
use crate::git::GitOperations;
use crate::resolve::FileResolver;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

mod output;
mod progress;

pub use output::Output;
pub use progress::ConsoleObserver;

#[derive(Parser, Debug)]
#[command(
    name = "lintgate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run an external linter over source files in parallel and fail on any finding",
    long_about = "lintgate runs the configured checker (pylint by default) once per file with \
                  a bounded number of concurrent processes. With no FILES it checks every \
                  eligible file in the repository. Exit status is 0 when every file is clean, \
                  1 when any file has findings and 2 when the run could not start."
)]
pub struct Cli {
    /// Run as if started in <DIR> and check the tree rooted there
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Increase verbosity; any level streams results as they finish
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Checker executable, overriding the configured one and its arguments
    #[arg(long, value_name = "PROGRAM")]
    pub tool: Option<String>,

    /// Argument passed to the checker before the file path (repeatable);
    /// replaces the configured arguments
    #[arg(long = "tool-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub tool_args: Vec<String>,

    /// Maximum number of concurrent checker processes
    #[arg(short = 'j', long = "num-procs", value_name = "N")]
    pub num_procs: Option<usize>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Files to check, as paths or base names; all eligible files when empty
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,
}

impl Cli {
    /// Execute the run and return the process exit code
    pub fn run(self) -> Result<i32> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Cannot change to directory {}", dir.display()))?;
        }
        let working_dir = std::env::current_dir().context("Cannot determine current directory")?;
        let root = match &self.directory {
            Some(_) => working_dir.clone(),
            None => source_root(&working_dir),
        };
        debug!("source root: {}", root.display());

        let mut config = LintgateConfig::load(&root, self.config.as_deref())?;
        self.apply_overrides(&mut config);
        let workers = config.worker_count()?;

        // Fail before any file is touched when the checker cannot be run
        let program = ToolAvailability::probe(&config.tool.name).require(&config.tool.name)?;
        debug!("using checker {}", program.display());

        let resolver = FileResolver::new(&root, &config.discovery)?.with_working_dir(&working_dir);
        let targets = resolver.resolve(&self.files)?;
        if targets.is_empty() {
            output.verbose("No files to check");
        }
        info!("checking {} files with up to {} workers", targets.len(), workers.get());

        let checker = ExternalChecker::new(program, config.tool.args).with_working_dir(resolver.root());
        let interactive = self.verbose > 0 && self.format == ReportFormat::Text && !output.is_quiet();
        let orchestrator = Orchestrator::new(checker).with_observer(Arc::new(ConsoleObserver));
        let report = orchestrator.run(&targets, workers, interactive)?;

        Reporter::new(&output, self.format, interactive).render(&report)?;
        Ok(exit_code(decide(&report)))
    }

    /// Flags win over every config layer. Configured arguments belong to the
    /// configured checker, so naming another tool drops them.
    fn apply_overrides(&self, config: &mut LintgateConfig) {
        if let Some(tool) = &self.tool {
            if *tool != config.tool.name {
                config.tool.args.clear();
            }
            config.tool.name = tool.clone();
        }
        if !self.tool_args.is_empty() {
            config.tool.args = self.tool_args.clone();
        }
        if let Some(num_procs) = self.num_procs {
            config.run.num_procs = num_procs;
        }
    }
}

/// Work tree of the enclosing repository, or the working directory itself
fn source_root(working_dir: &Path) -> PathBuf {
    GitOperations::discover(working_dir)
        .ok()
        .and_then(|git| git.workdir().map(Path::to_path_buf))
        .unwrap_or_else(|| working_dir.to_path_buf())
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // Keep the walker and glob crates quiet unless tracing everything
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // A subscriber may already be installed when embedded in another binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags_and_files() {
        let cli = Cli::try_parse_from([
            "lintgate", "-vv", "-j", "4", "--tool", "flake8", "--format", "json", "a.py", "lib/b.py",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.num_procs, Some(4));
        assert_eq!(cli.tool.as_deref(), Some("flake8"));
        assert_eq!(cli.format, ReportFormat::Json);
        assert_eq!(cli.files, vec!["a.py".to_string(), "lib/b.py".to_string()]);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["lintgate"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.num_procs, None);
        assert_eq!(cli.format, ReportFormat::Text);
        assert!(cli.files.is_empty());
    }

    fn default_config() -> LintgateConfig {
        let dir = tempfile::TempDir::new().unwrap();
        LintgateConfig::load(dir.path(), None).unwrap()
    }

    #[test]
    fn test_tool_override_drops_configured_args() {
        let mut config = default_config();
        assert!(!config.tool.args.is_empty());

        Cli::try_parse_from(["lintgate", "--tool", "ruff"])
            .unwrap()
            .apply_overrides(&mut config);
        assert_eq!(config.tool.name, "ruff");
        assert!(config.tool.args.is_empty());
    }

    #[test]
    fn test_tool_args_replace_configured_args() {
        let mut config = default_config();

        Cli::try_parse_from([
            "lintgate", "--tool", "flake8", "--tool-arg", "--max-line-length=100", "--tool-arg", "-q",
        ])
        .unwrap()
        .apply_overrides(&mut config);
        assert_eq!(config.tool.name, "flake8");
        assert_eq!(config.tool.args, vec!["--max-line-length=100".to_string(), "-q".to_string()]);
    }

    #[test]
    fn test_same_tool_keeps_configured_args() {
        let mut config = default_config();
        let configured = config.tool.args.clone();
        let name = config.tool.name.clone();

        Cli::try_parse_from(["lintgate", "--tool", name.as_str(), "-j", "3"])
            .unwrap()
            .apply_overrides(&mut config);
        assert_eq!(config.tool.args, configured);
        assert_eq!(config.run.num_procs, 3);
    }

    #[test]
    fn test_non_numeric_worker_count_rejected() {
        assert!(Cli::try_parse_from(["lintgate", "-j", "many"]).is_err());
    }
}
