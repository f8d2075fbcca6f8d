//! Check orchestration core
//!
//! A run takes a [`TargetSet`] from the resolver, hands every target to an
//! [`Invoker`] on a bounded worker pool and gathers one [`CheckResult`] per
//! target into a [`CheckReport`]. The report is keyed by path, so its content
//! never depends on scheduling order.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

pub mod invoker;
pub mod observer;
pub mod orchestrator;
pub mod report;

pub use invoker::{ExternalChecker, Invoker, ToolAvailability};
pub use observer::{NullObserver, ProgressObserver, RecordingObserver};
pub use orchestrator::Orchestrator;
pub use report::{EXIT_ERROR, EXIT_FINDINGS, EXIT_SUCCESS, ReportFormat, Reporter, decide, exit_code};

/// One file selected for checking, as an absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckTarget(PathBuf);

impl CheckTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug_assert!(path.is_absolute(), "check targets must be absolute: {}", path.display());
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for CheckTarget {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Targets in resolution order, each path at most once
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<CheckTarget>,
    seen: HashSet<CheckTarget>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target; returns false if it was already present
    pub fn insert(&mut self, target: CheckTarget) -> bool {
        if self.seen.contains(&target) {
            return false;
        }
        self.seen.insert(target.clone());
        self.targets.push(target);
        true
    }

    pub fn contains(&self, target: &CheckTarget) -> bool {
        self.seen.contains(target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckTarget> {
        self.targets.iter()
    }

    pub fn to_vec(&self) -> Vec<CheckTarget> {
        self.targets.clone()
    }
}

impl FromIterator<CheckTarget> for TargetSet {
    fn from_iter<I: IntoIterator<Item = CheckTarget>>(iter: I) -> Self {
        let mut set = TargetSet::new();
        for target in iter {
            set.insert(target);
        }
        set
    }
}

/// Verdict derived from a result's diagnostic text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Findings,
}

/// Outcome of checking a single target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    target: CheckTarget,
    diagnostics: String,
    command: Option<String>,
}

impl CheckResult {
    /// Empty diagnostics mean the file is clean
    pub fn new(target: CheckTarget, diagnostics: impl Into<String>) -> Self {
        Self {
            target,
            diagnostics: diagnostics.into(),
            command: None,
        }
    }

    /// A findings result describing a failed invocation
    pub fn fault(target: CheckTarget, message: impl fmt::Display) -> Self {
        let diagnostics = format!("lintgate: checker could not be run: {message}");
        Self::new(target, diagnostics)
    }

    /// Attach the command line that produced this result
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn target(&self) -> &CheckTarget {
        &self.target
    }

    pub fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn verdict(&self) -> Verdict {
        if self.diagnostics.is_empty() {
            Verdict::Clean
        } else {
            Verdict::Findings
        }
    }

    pub fn is_clean(&self) -> bool {
        self.verdict() == Verdict::Clean
    }
}

/// Result mapping for one run: exactly one entry per checked target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    results: BTreeMap<CheckTarget, CheckResult>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result. Entries are write-once: a second result for the same
    /// target is handed back untouched.
    pub fn insert(&mut self, result: CheckResult) -> Result<(), CheckResult> {
        if self.results.contains_key(result.target()) {
            return Err(result);
        }
        self.results.insert(result.target().clone(), result);
        Ok(())
    }

    pub fn get(&self, target: &CheckTarget) -> Option<&CheckResult> {
        self.results.get(target)
    }

    pub fn contains(&self, target: &CheckTarget) -> bool {
        self.results.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results sorted by path
    pub fn iter(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.values()
    }

    /// Results with non-empty diagnostics, sorted by path
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.iter().filter(|result| !result.is_clean())
    }

    /// Absolute path → diagnostic text (empty string = clean)
    pub fn diagnostics(&self) -> BTreeMap<String, String> {
        self.results
            .iter()
            .map(|(target, result)| (target.to_string(), result.diagnostics().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(path: &str) -> CheckTarget {
        CheckTarget::new(std::env::temp_dir().join(path))
    }

    #[test]
    fn test_target_set_drops_duplicates() {
        let mut set = TargetSet::new();
        assert!(set.insert(target("a.py")));
        assert!(set.insert(target("b.py")));
        assert!(!set.insert(target("a.py")));

        assert_eq!(set.len(), 2);
        let order: Vec<_> = set.iter().cloned().collect();
        assert_eq!(order, vec![target("a.py"), target("b.py")]);
    }

    #[test]
    fn test_target_set_from_iter() {
        let set: TargetSet = vec![target("x.py"), target("x.py"), target("y.py")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&target("y.py")));
    }

    #[test]
    fn test_result_verdict_follows_text() {
        let clean = CheckResult::new(target("clean.py"), "");
        assert!(clean.is_clean());
        assert_eq!(clean.verdict(), Verdict::Clean);

        let dirty = CheckResult::new(target("bad.py"), "line 3: unused import");
        assert!(!dirty.is_clean());
        assert_eq!(dirty.verdict(), Verdict::Findings);
    }

    #[test]
    fn test_fault_result_has_findings() {
        let result = CheckResult::fault(target("crash.py"), "segmentation fault");
        assert!(!result.is_clean());
        assert!(result.diagnostics().contains("segmentation fault"));
    }

    #[test]
    fn test_report_is_write_once() {
        let mut report = CheckReport::new();
        assert!(report.insert(CheckResult::new(target("a.py"), "")).is_ok());

        let duplicate = CheckResult::new(target("a.py"), "late finding");
        let rejected = report.insert(duplicate.clone()).unwrap_err();
        assert_eq!(rejected, duplicate);
        assert_eq!(report.get(&target("a.py")).unwrap().diagnostics(), "");
    }

    #[test]
    fn test_report_diagnostics_mapping() {
        let mut report = CheckReport::new();
        report.insert(CheckResult::new(target("b.py"), "E1: bad")).unwrap();
        report.insert(CheckResult::new(target("a.py"), "")).unwrap();

        let mapping = report.diagnostics();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&target("a.py").to_string()], "");
        assert_eq!(mapping[&target("b.py").to_string()], "E1: bad");

        let failures: Vec<_> = report.failures().map(|r| r.target().clone()).collect();
        assert_eq!(failures, vec![target("b.py")]);
    }
}
