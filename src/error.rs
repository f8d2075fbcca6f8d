//! Error taxonomy for a lintgate run
//!
//! Precondition failures (`ToolNotAvailable`, `UnresolvedFile`, `InvalidWorkerCount`,
//! `Discovery`) abort the run before any file is checked. `InvocationFault` is
//! per-file and never escapes the orchestrator: it is folded into a findings result.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while preparing or running a check
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("external checker `{tool}` is not available: {source}")]
    ToolNotAvailable {
        tool: String,
        #[source]
        source: which::Error,
    },

    #[error("could not resolve `{requested}`: {reason}")]
    UnresolvedFile {
        requested: String,
        reason: Unresolved,
    },

    #[error("checker failed on {}: {message}", path.display())]
    InvocationFault { path: PathBuf, message: String },

    #[error("worker count must be at least 1 (got {0})")]
    InvalidWorkerCount(usize),

    #[error("cannot list source files under {}: {message}", root.display())]
    Discovery { root: PathBuf, message: String },

    #[error("worker pool failed: {0}")]
    WorkerPool(String),
}

/// Why a requested file name could not be mapped to a single path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    NotFound,
    Ambiguous(Vec<PathBuf>),
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolved::NotFound => write!(f, "no such file in the source tree"),
            Unresolved::Ambiguous(candidates) => {
                write!(f, "matches {} files:", candidates.len())?;
                for candidate in candidates {
                    write!(f, " {}", candidate.display())?;
                }
                Ok(())
            }
        }
    }
}

impl CheckError {
    /// True for failures that must stop the run before any file is dispatched
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            CheckError::InvocationFault { .. } | CheckError::WorkerPool(_)
        )
    }
}
