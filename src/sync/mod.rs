mod jobs;
mod progress;

use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar};
use rayon::prelude::*;
use std::path::Path;
use std::time::Duration;
use tracing::error;

use crate::config::{Config, load_config};

pub use jobs::{SyncJob, build_jobs};
use progress::{err_style, ok_style, spinner_style};

/// Bring every configured branch to its revision.
///
/// High-level flow:
/// 1. Load the configuration (`--config` or the default location).
/// 2. Build one job per `[[branches]]` entry (see [`jobs::build_jobs`]).
/// 3. Run [`Branch::ensure`](crate::bzr::Branch::ensure) for all jobs **in
///    parallel**, one spinner per branch. Each job owns its target
///    directory, so adapters never share a working copy.
///
/// Errors in individual jobs are shown on the job's line; the others keep
/// running. The command fails if any job failed.
pub fn cmd_sync(config: Option<&Path>, offline: bool) -> Result<()> {
    let loaded = load_config(config)?;
    if loaded.config.branches.is_empty() {
        eprintln!("no branches in {}", loaded.path.display());
        return Ok(());
    }

    let jobs = build_jobs(&loaded, offline)?;

    let mp = MultiProgress::new();
    let run_style = spinner_style();
    let done_style = ok_style();
    let fail_style = err_style();

    let mut bars: Vec<ProgressBar> = Vec::with_capacity(jobs.len());
    for j in &jobs {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(run_style.clone());
        pb.set_prefix(j.display.clone());
        pb.set_message(format!("to {}", j.revision));
        pb.enable_steady_tick(Duration::from_millis(80));
        bars.push(pb);
    }

    let failures: usize = jobs
        .par_iter()
        .enumerate()
        .map(|(idx, job)| {
            let pb = &bars[idx];
            match run_job(&loaded.config, job) {
                Ok(revno) => {
                    pb.set_style(done_style.clone());
                    pb.finish_with_message(revno);
                    0
                }
                Err(e) => {
                    error!(path = %job.target.display(), error = %e, "sync failed");
                    pb.set_style(fail_style.clone());
                    pb.set_prefix(job.target.display().to_string());
                    pb.finish_with_message(e.to_string());
                    1
                }
            }
        })
        .sum();

    if failures > 0 {
        bail!("{} of {} branches failed", failures, jobs.len());
    }
    Ok(())
}

/// Ensure one branch and report the revision its tree ended up at.
fn run_job(config: &Config, job: &SyncJob) -> crate::Result<String> {
    let branch = config.open(&job.target, &job.url, job.options)?;
    branch.ensure(&job.revision)?;
    Ok(branch.parents()?.join(", "))
}
