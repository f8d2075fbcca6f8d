//! Maps requested file names onto the set of files to check
//!
//! With no request every eligible file under the source root is checked.
//! Candidates come from the git index when available, otherwise from a
//! gitignore-aware walk. A file is eligible when its extension is listed, or
//! when its first line is a shebang for one of the configured interpreters.

use crate::check::{CheckTarget, TargetSet};
use crate::config::DiscoveryConfig;
use crate::error::{CheckError, Unresolved};
use crate::git::GitOperations;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

// Only the start of a file is needed to find its shebang
const SHEBANG_PROBE_BYTES: u64 = 256;

pub struct FileResolver {
    root: PathBuf,
    working_dir: PathBuf,
    use_git: bool,
    extensions: Vec<String>,
    shebang: Option<Regex>,
    exclude: GlobSet,
}

impl FileResolver {
    pub fn new(root: &Path, config: &DiscoveryConfig) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Source root not found: {}", root.display()))?;

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob =
                Glob::new(pattern).with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }
        let exclude = builder.build().context("Failed to build exclude patterns")?;

        Ok(Self {
            working_dir: root.clone(),
            root,
            use_git: config.use_git,
            extensions: config.extensions.clone(),
            shebang: shebang_regex(&config.interpreters)?,
            exclude,
        })
    }

    /// Directory that relative requests are interpreted against
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the requested names into a duplicate-free target set.
    ///
    /// An empty request selects every eligible file. Each entry is either an
    /// existing file or a unique trailing-path match among eligible files;
    /// anything else fails the whole resolve.
    pub fn resolve(&self, requested: &[String]) -> Result<TargetSet, CheckError> {
        if requested.is_empty() {
            return Ok(self.discover()?.into_iter().map(CheckTarget::new).collect());
        }

        let mut targets = TargetSet::new();
        let mut eligible: Option<Vec<PathBuf>> = None;

        for entry in requested {
            let path = match self.working_dir.join(entry).canonicalize() {
                Ok(direct) if direct.is_file() => direct,
                _ => {
                    if eligible.is_none() {
                        eligible = Some(self.discover()?);
                    }
                    self.search(entry, eligible.as_deref().unwrap_or_default())?
                }
            };

            if !targets.insert(CheckTarget::new(path)) {
                debug!("{} requested more than once", entry);
            }
        }

        Ok(targets)
    }

    /// Every eligible file under the root, absolute and sorted
    pub fn discover(&self) -> Result<Vec<PathBuf>, CheckError> {
        let candidates = match self.git_candidates()? {
            Some(files) => files,
            None => self.walk_candidates(),
        };

        let mut eligible: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|path| self.is_eligible(path))
            .collect();
        eligible.sort();
        eligible.dedup();

        debug!("discovered {} eligible files under {}", eligible.len(), self.root.display());
        Ok(eligible)
    }

    fn search(&self, entry: &str, eligible: &[PathBuf]) -> Result<PathBuf, CheckError> {
        let wanted = Path::new(entry);
        let not_found = || CheckError::UnresolvedFile {
            requested: entry.to_string(),
            reason: Unresolved::NotFound,
        };

        // "", "." and "./" would match every path by suffix
        if !wanted
            .components()
            .any(|component| matches!(component, Component::Normal(_)))
        {
            return Err(not_found());
        }

        let mut matches: Vec<PathBuf> = eligible
            .iter()
            .filter(|path| {
                path.strip_prefix(&self.root)
                    .is_ok_and(|relative| relative.ends_with(wanted))
            })
            .cloned()
            .collect();

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(not_found()),
            _ => Err(CheckError::UnresolvedFile {
                requested: entry.to_string(),
                reason: Unresolved::Ambiguous(matches),
            }),
        }
    }

    /// Tracked files under the root, or None when git is off or absent
    fn git_candidates(&self) -> Result<Option<Vec<PathBuf>>, CheckError> {
        if !self.use_git {
            return Ok(None);
        }

        let git = match GitOperations::discover(&self.root) {
            Ok(git) => git,
            Err(e) => {
                debug!("falling back to a directory walk: {:#}", e);
                return Ok(None);
            }
        };
        let Some(workdir) = git.workdir() else {
            return Ok(None);
        };

        let discovery_error = |e: anyhow::Error| CheckError::Discovery {
            root: self.root.clone(),
            message: format!("{e:#}"),
        };
        let workdir = workdir
            .canonicalize()
            .context("Failed to resolve Git work tree")
            .map_err(discovery_error)?;
        let tracked = git.tracked_files().map_err(discovery_error)?;

        Ok(Some(
            tracked
                .into_iter()
                .map(|relative| workdir.join(relative))
                .filter(|path| path.starts_with(&self.root) && path.is_file())
                .collect(),
        ))
    }

    fn walk_candidates(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkBuilder::new(&self.root).build() {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => warn!("skipping unreadable entry: {}", e),
            }
        }

        files
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if self.exclude.is_match(relative) {
            trace!("excluded {}", relative.display());
            return false;
        }

        let listed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext));
        listed || self.has_interpreter_shebang(path)
    }

    fn has_interpreter_shebang(&self, path: &Path) -> bool {
        let Some(shebang) = &self.shebang else {
            return false;
        };
        first_line(path).is_some_and(|line| shebang.is_match(&line))
    }
}

/// `#!` line naming one of the interpreters, with an optional version suffix
/// (`python3.11`), either directly or through `env`
fn shebang_regex(interpreters: &[String]) -> Result<Option<Regex>> {
    if interpreters.is_empty() {
        return Ok(None);
    }

    let alternatives: Vec<String> = interpreters.iter().map(|name| regex::escape(name)).collect();
    let pattern = format!(r"^#!.*\b(?:{})[0-9.]*(?:\s|$)", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .context("Invalid interpreter name")
}

fn first_line(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file.take(SHEBANG_PROBE_BYTES));
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line).ok()?;
    Some(String::from_utf8_lossy(&line).trim_end().to_string())
}
