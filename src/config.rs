use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bzr::{Branch, BranchOptions, BzrCommand, Launchpad, Runner};
use crate::paths::paths;

/// Top-level configuration structure loaded from `config.toml`.
///
/// Example TOML:
/// ```toml
/// offline = false
/// launchpad-login = "joe"
///
/// [[branches]]
/// url      = "lp:anybox.recipe.openerp"
/// target   = "parts/recipe"
/// revision = "last:1"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Forbid network access for every branch.
    #[serde(default)]
    pub offline: bool,
    /// Tool executable; looked up on `PATH` when absent.
    #[serde(default)]
    pub bzr: Option<PathBuf>,
    /// Launchpad user; `lp:` locations then go through `bzr+ssh`.
    #[serde(default)]
    pub launchpad_login: Option<String>,
    #[serde(default)]
    pub branches: Vec<BranchEntry>,
}

/// A single `[[branches]]` entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct BranchEntry {
    pub url: String,
    pub target: PathBuf,
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub clear_locks: bool,
    #[serde(default)]
    pub offline: bool,
}

impl Config {
    /// Runner for the configured executable, or the one found on `PATH`.
    pub fn runner(&self) -> Arc<dyn Runner> {
        match &self.bzr {
            Some(p) => Arc::new(BzrCommand::new(p)),
            None => Arc::new(BzrCommand::locate()),
        }
    }

    pub fn directory(&self) -> Launchpad {
        Launchpad::new(self.launchpad_login.clone())
    }

    /// Build an adapter wired with this configuration's tool and directory.
    pub fn open(
        &self,
        target: impl Into<PathBuf>,
        url: &str,
        options: BranchOptions,
    ) -> crate::Result<Branch> {
        Branch::with_runner(target, url, options, self.runner(), Some(&self.directory()))
    }
}

fn default_revision() -> String {
    "last:1".to_string()
}

impl BranchEntry {
    /// Adapter options for this entry; `offline` is also forced by the
    /// global flag.
    pub fn options(&self, global_offline: bool) -> BranchOptions {
        BranchOptions {
            offline: self.offline || global_offline,
            clear_locks: self.clear_locks,
            stacked: self.stacked,
        }
    }
}

/// A loaded configuration and the directory relative targets hang off.
#[derive(Debug)]
pub struct Loaded {
    pub config: Config,
    pub path: PathBuf,
}

impl Loaded {
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Absolute target directory of `entry`.
    pub fn target_of(&self, entry: &BranchEntry) -> PathBuf {
        if entry.target.is_absolute() {
            entry.target.clone()
        } else {
            self.base_dir().join(&entry.target)
        }
    }
}

/// Load and parse the configuration at `path`, or at the default location.
///
/// # Errors
/// - Returns an error if the file cannot be read.
/// - Returns an error if parsing the TOML fails.
pub fn load_config(path: Option<&Path>) -> Result<Loaded> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => paths()?.config,
    };
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    let config = parse_config(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Loaded { config, path })
}

pub fn parse_config(txt: &str) -> Result<Config> {
    Ok(toml::from_str(txt)?)
}
