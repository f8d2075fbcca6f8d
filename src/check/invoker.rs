//! External checker invocation
//!
//! The checker is probed once with [`ToolAvailability::probe`] before any
//! work is scheduled. After that, [`ExternalChecker`] launches one process per
//! target and turns its captured output into a [`CheckResult`].

use super::{CheckResult, CheckTarget};
use crate::error::CheckError;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs a check against one target.
///
/// `Err` is reserved for faults (the checker could not be run at all); a
/// checker that ran and reported problems returns `Ok` with findings.
pub trait Invoker: Send + Sync {
    fn invoke(&self, target: &CheckTarget) -> Result<CheckResult, CheckError>;
}

/// Result of looking up the checker executable
#[derive(Debug)]
pub enum ToolAvailability {
    Available(PathBuf),
    Missing(which::Error),
}

impl ToolAvailability {
    /// Look the tool up on PATH; explicit paths are checked as given
    pub fn probe(tool: &str) -> Self {
        match which::which(tool) {
            Ok(path) => {
                debug!("found checker {} at {}", tool, path.display());
                ToolAvailability::Available(path)
            }
            Err(e) => ToolAvailability::Missing(e),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ToolAvailability::Available(_))
    }

    /// Turn a missing tool into the run-level precondition failure
    pub fn require(self, tool: &str) -> Result<PathBuf, CheckError> {
        match self {
            ToolAvailability::Available(path) => Ok(path),
            ToolAvailability::Missing(source) => Err(CheckError::ToolNotAvailable {
                tool: tool.to_string(),
                source,
            }),
        }
    }
}

/// Launches `<program> <args...> <target>` for every target
#[derive(Debug, Clone)]
pub struct ExternalChecker {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ExternalChecker {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Run the checker from this directory instead of the current one
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Shell-like rendering of the command, for logs and re-run hints
    pub fn command_line(&self, target: &CheckTarget) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().cloned());
        parts.push(target.to_string());
        parts.join(" ")
    }
}

impl Invoker for ExternalChecker {
    fn invoke(&self, target: &CheckTarget) -> Result<CheckResult, CheckError> {
        let command_line = self.command_line(target);
        debug!("running {}", command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(target.path())
            .stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| CheckError::InvocationFault {
            path: target.path().to_path_buf(),
            message: format!("failed to launch {}: {}", self.program.display(), e),
        })?;

        let text = combine_output(&output.stdout, &output.stderr);
        debug!(
            "{} exited with {} ({} bytes of diagnostics)",
            target,
            output.status,
            text.len()
        );

        // No exit code means the process was killed by a signal
        if text.is_empty() && output.status.code().is_none() {
            return Err(CheckError::InvocationFault {
                path: target.path().to_path_buf(),
                message: format!("{} terminated abnormally ({})", self.program.display(), output.status),
            });
        }

        Ok(CheckResult::new(target.clone(), text).with_command(command_line))
    }
}

/// Trimmed stdout and stderr, newline-joined when both are present
fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_combine_output() {
        assert_eq!(combine_output(b"", b""), "");
        assert_eq!(combine_output(b"  \n", b"\n"), "");
        assert_eq!(combine_output(b"out\n", b""), "out");
        assert_eq!(combine_output(b"", b"err\n"), "err");
        assert_eq!(combine_output(b"out\n", b"err\n"), "out\nerr");
        assert_eq!(combine_output(&[0x66, 0xff, 0x6f], b""), "f\u{fffd}o");
    }

    #[test]
    fn test_probe_missing_tool() {
        let availability = ToolAvailability::probe("lintgate-no-such-checker-7f3a");
        assert!(!availability.is_available());

        let err = availability.require("lintgate-no-such-checker-7f3a").unwrap_err();
        assert!(matches!(err, CheckError::ToolNotAvailable { ref tool, .. } if tool == "lintgate-no-such-checker-7f3a"));
    }

    #[test]
    fn test_command_line_rendering() {
        let checker = ExternalChecker::new("/usr/bin/pylint", vec!["--score=n".to_string()]);
        let target = CheckTarget::new(std::env::temp_dir().join("a.py"));
        assert_eq!(
            checker.command_line(&target),
            format!("/usr/bin/pylint --score=n {}", target)
        );
    }

    #[test]
    fn test_launch_failure_is_a_fault() {
        let dir = TempDir::new().unwrap();
        let checker = ExternalChecker::new(dir.path().join("not-a-program"), Vec::new());
        let target = CheckTarget::new(dir.path().join("a.py"));

        let err = checker.invoke(&target).unwrap_err();
        assert!(matches!(err, CheckError::InvocationFault { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("fake-checker");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        /// Runs the script through `sh` so the freshly written file is never exec'd
        fn checker(dir: &TempDir, body: &str, args: &[&str]) -> ExternalChecker {
            let script = script(dir, body);
            let mut all = vec![script.display().to_string()];
            all.extend(args.iter().map(|arg| arg.to_string()));
            ExternalChecker::new("/bin/sh", all)
        }

        fn target_file(dir: &TempDir, name: &str) -> CheckTarget {
            let path = dir.path().join(name);
            fs::write(&path, "x = 1\n").unwrap();
            CheckTarget::new(path)
        }

        #[test]
        fn test_probe_explicit_path() {
            let dir = TempDir::new().unwrap();
            let tool = script(&dir, "exit 0");
            let availability = ToolAvailability::probe(tool.to_str().unwrap());
            assert!(availability.is_available());
        }

        #[test]
        fn test_silent_tool_is_clean() {
            let dir = TempDir::new().unwrap();
            let checker = checker(&dir, "exit 0", &[]);
            let target = target_file(&dir, "clean.py");

            let result = checker.invoke(&target).unwrap();
            assert!(result.is_clean());
            assert_eq!(result.target(), &target);
        }

        #[test]
        fn test_output_is_findings_regardless_of_exit_code() {
            let dir = TempDir::new().unwrap();
            let checker = checker(&dir, "echo 'line 3: unused import'\nexit 0", &[]);
            let result = checker.invoke(&target_file(&dir, "bad.py")).unwrap();
            assert_eq!(result.diagnostics(), "line 3: unused import");
        }

        #[test]
        fn test_exit_code_alone_is_not_findings() {
            let dir = TempDir::new().unwrap();
            let checker = checker(&dir, "exit 4", &[]);
            let result = checker.invoke(&target_file(&dir, "quiet.py")).unwrap();
            assert!(result.is_clean());
        }

        #[test]
        fn test_stderr_is_captured() {
            let dir = TempDir::new().unwrap();
            let checker = checker(&dir, "echo out\necho err >&2\nexit 1", &[]);
            let result = checker.invoke(&target_file(&dir, "mixed.py")).unwrap();
            assert_eq!(result.diagnostics(), "out\nerr");
        }

        #[test]
        fn test_args_precede_target() {
            let dir = TempDir::new().unwrap();
            let checker = checker(&dir, "echo \"$@\"", &["--score=n", "-d"]);
            let target = target_file(&dir, "args.py");
            let result = checker.invoke(&target).unwrap();
            assert_eq!(result.diagnostics(), format!("--score=n -d {}", target));
            assert_eq!(result.command(), Some(checker.command_line(&target).as_str()));
        }

        #[test]
        fn test_working_dir_is_applied() {
            let dir = TempDir::new().unwrap();
            let workdir = dir.path().canonicalize().unwrap();
            let checker = checker(&dir, "pwd -P", &[])
                .with_working_dir(&workdir);
            let result = checker.invoke(&target_file(&dir, "where.py")).unwrap();
            assert_eq!(result.diagnostics(), workdir.display().to_string());
        }

        #[test]
        fn test_killed_tool_is_a_fault() {
            let dir = TempDir::new().unwrap();
            let checker = checker(&dir, "kill -9 $$", &[]);
            let err = checker.invoke(&target_file(&dir, "crash.py")).unwrap_err();
            assert!(matches!(err, CheckError::InvocationFault { .. }));
        }
    }
}
