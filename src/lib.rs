//! # lintgate - parallel lint gate for pre-commit hooks and CI
//!
//! lintgate runs an external code-quality checker (pylint by default) on
//! every requested source file, at most N processes at a time, and collects
//! the output into one report keyed by file path. The run passes only when
//! every file comes back with empty diagnostics.
//!
//! ## Pipeline
//!
//! - [`resolve`]: requested names (or nothing) → set of absolute paths
//! - [`check`]: bounded fan-out of checker invocations → report → verdict
//! - [`cli`]: flags, config layering, rendering and the exit code
//!
//! ## Quick Start
//!
//! ```bash
//! # Check every tracked Python file with 10 workers
//! lintgate
//!
//! # Check two files, streaming results as they finish
//! lintgate -v -j 4 app.py lib/util.py
//! ```

pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod parallel;
pub mod resolve;

pub use check::{CheckReport, CheckResult, CheckTarget, TargetSet};
pub use config::LintgateConfig;
pub use error::CheckError;
