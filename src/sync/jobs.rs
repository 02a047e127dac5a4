use anyhow::{Result, bail};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::bzr::BranchOptions;
use crate::config::Loaded;

/// Represents a single branch synchronization job.
///
/// Each job corresponds to one `[[branches]]` entry and carries everything
/// needed to build a [`Branch`](crate::bzr::Branch) and bring it to its
/// revision.
#[derive(Clone, Debug)]
pub struct SyncJob {
    pub display: String,
    pub url: String,
    pub target: PathBuf,
    pub revision: String,
    pub options: BranchOptions,
}

/// Build synchronization jobs from the loaded configuration.
///
/// Relative targets are resolved against the configuration file's directory,
/// and `offline` (global or from the CLI) is applied to every job.
///
/// # Errors
/// Two entries resolving to the same target directory are rejected: jobs run
/// in parallel and a working copy must be owned by a single adapter.
pub fn build_jobs(loaded: &Loaded, offline: bool) -> Result<Vec<SyncJob>> {
    let offline = offline || loaded.config.offline;
    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(loaded.config.branches.len());

    for entry in &loaded.config.branches {
        let target = loaded.target_of(entry);
        if !seen.insert(target.clone()) {
            bail!("target {} is listed more than once", target.display());
        }
        jobs.push(SyncJob {
            display: entry.target.display().to_string(),
            url: entry.url.clone(),
            target,
            revision: entry.revision.clone(),
            options: entry.options(offline),
        });
    }

    Ok(jobs)
}
