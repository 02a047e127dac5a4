//! # bzrsync
//!
//! **bzrsync** keeps Bazaar working copies at the revision a build asks for.
//!
//! Features:
//! - `bzrsync sync` brings every branch listed in the configuration to its revision
//! - `bzrsync get` does the same for a single branch given on the command line
//! - `bzrsync parents` / `revid` report the revision a working copy is at
//! - `bzrsync archive` exports a clean snapshot of a working copy
//! - `bzrsync conf` shows the recorded parent locations of a working copy
//! - `bzrsync list` shows configured branches and their current revision
//! - `bzrsync home` prints the configuration directory
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use bzrsync::bzr::{BranchConf, PARENT_LOCATION};
use bzrsync::{Branch, BranchOptions, Config, cmd_list, cmd_sync, load_config, paths};

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "bzrsync",
    version,
    about = "bzrsync - keep Bazaar working copies at a given revision",
    arg_required_else_help = true
)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/bzrsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Bring every configured branch to its revision
    Sync {
        /// Never pull; fail for revisions not available locally
        #[arg(long)]
        offline: bool,
    },
    /// Bring one branch to a revision
    Get {
        url: String,
        target: PathBuf,
        /// Revision specifier (number, last:N, tag, revid:...)
        #[arg(short, long, default_value = "last:1")]
        revision: String,
        #[arg(long)]
        offline: bool,
        /// Break stale locks before updating
        #[arg(long)]
        clear_locks: bool,
        /// Create the branch stacked on its source
        #[arg(long)]
        stacked: bool,
    },
    /// Print the revision number(s) of a working tree
    Parents { target: PathBuf },
    /// Print the revision id of a revision in a working copy
    Revid { target: PathBuf, revision: String },
    /// Export the checked-out revision of a working copy
    Archive { target: PathBuf, dest: PathBuf },
    /// Print the parent locations recorded in branch.conf
    Conf { target: PathBuf },
    /// List configured branches
    List,
    /// Print the configuration directory
    Home,
}

/// CLI entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    bzrsync::logging::init(cli.verbose);
    let Some(cmd) = cli.cmd else {
        return Ok(());
    };
    let config = cli.config.as_deref();

    match cmd {
        Cmd::Sync { offline } => cmd_sync(config, offline),
        Cmd::List => cmd_list(config),
        Cmd::Home => {
            println!("{}", paths()?.home.display());
            Ok(())
        }
        Cmd::Get {
            url,
            target,
            revision,
            offline,
            clear_locks,
            stacked,
        } => {
            let cfg = optional_config(config)?;
            let options = BranchOptions {
                offline: offline || cfg.offline,
                clear_locks,
                stacked,
            };
            let branch = cfg.open(&target, &url, options)?;
            branch
                .ensure(&revision)
                .with_context(|| format!("{} at {}", branch.url(), revision))?;
            println!("{}", branch.parents()?.join("\n"));
            Ok(())
        }
        Cmd::Parents { target } => {
            let branch = existing(config, &target)?;
            println!("{}", branch.parents()?.join("\n"));
            Ok(())
        }
        Cmd::Revid { target, revision } => {
            let branch = existing(config, &target)?;
            println!("{}", branch.revision_id(&revision)?);
            Ok(())
        }
        Cmd::Archive { target, dest } => {
            existing(config, &target)?.archive(&dest)?;
            Ok(())
        }
        Cmd::Conf { target } => {
            let branch = existing(config, &target)?;
            for (k, v) in branch.parse_conf()? {
                println!("{} = {}", k, v);
            }
            Ok(())
        }
    }
}

/// The configuration if one was given or exists at the default location.
fn optional_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Ok(load_config(Some(p))?.config),
        None => {
            let default = paths()?.config;
            if default.exists() {
                Ok(load_config(Some(&default))?.config)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Adapter for a working copy that is already on disk; its source is read
/// back from `branch.conf`.
fn existing(config: Option<&Path>, target: &Path) -> Result<Branch> {
    let cfg = optional_config(config)?;
    let conf_path = target.join(".bzr").join("branch").join("branch.conf");
    let conf = BranchConf::read(&conf_path)
        .with_context(|| format!("not a branch: {}", conf_path.display()))?;
    let url = conf.get(PARENT_LOCATION).unwrap_or_default().to_string();
    Ok(cfg.open(target, &url, BranchOptions::default())?)
}
