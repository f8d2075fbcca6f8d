//! Configuration management for lintgate
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. built-in defaults (`default-config.toml`, embedded at compile time)
//! 2. user config in `<config dir>/lintgate/config.{toml,json,yaml,yml}`
//! 3. repository config `lintgate.{toml,json,yaml,yml}` in the source root
//! 4. `LINTGATE_` environment variables, `__` separating sections
//!    (`LINTGATE_RUN__NUM_PROCS=4`)
//!
//! An explicit `--config FILE` replaces layers 2 and 3.

use crate::error::CheckError;
use crate::parallel::WorkerCount;
use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};


// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "LINTGATE_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintgateConfig {
    /// External checker settings
    pub tool: ToolConfig,

    /// Worker pool settings
    pub run: RunConfig,

    /// Which files a full run checks
    pub discovery: DiscoveryConfig,
}

/// External checker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Executable name or path
    pub name: String,

    /// Arguments placed before the file path
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum concurrent checker processes
    pub num_procs: usize,
}

/// File discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// List candidates from the git index when inside a work tree
    #[serde(default = "default_use_git")]
    pub use_git: bool,

    /// Extensions (without the dot) that are always eligible
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Interpreter names accepted in a `#!` line
    #[serde(default)]
    pub interpreters: Vec<String>,

    /// Globs relative to the source root that are never checked
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_use_git() -> bool {
    true
}

impl LintgateConfig {
    /// Load the layered configuration for a source root
    pub fn load(root: &Path, custom_config: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(root, custom_config, ENV_PREFIX)?;
        Self::from_figment(&figment)
    }

    fn figment(root: &Path, custom_config: Option<&Path>, env_prefix: &str) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                anyhow::bail!("Config file not found: {}", custom_path.display());
            }
            figment = merge_file(figment, custom_path);
        } else {
            if let Some(user_dir) = Self::user_config_dir() {
                figment = merge_stem(figment, &user_dir.join("config"));
            }
            figment = merge_stem(figment, &root.join("lintgate"));
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed(env_prefix).split("__")))
    }

    fn from_figment(figment: &Figment) -> Result<Self> {
        figment
            .extract()
            .context("Invalid lintgate configuration")
    }

    fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lintgate"))
    }

    /// Validated worker pool size
    pub fn worker_count(&self) -> Result<WorkerCount, CheckError> {
        WorkerCount::new(self.run.num_procs)
    }
}

/// Merge `<stem>.toml`, `.json`, `.yaml` and `.yml`; missing files are skipped
fn merge_stem(figment: Figment, stem: &Path) -> Figment {
    figment
        .merge(Toml::file(stem.with_extension("toml")))
        .merge(Json::file(stem.with_extension("json")))
        .merge(Yaml::file(stem.with_extension("yaml")))
        .merge(Yaml::file(stem.with_extension("yml")))
}

/// Merge one file, choosing the format from its extension (TOML by default)
fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}
