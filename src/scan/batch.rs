use super::pipeline::{prepare_job, run_repo, RepoJob};
use super::WorkDirs;
use crate::cache::Cache;
use crate::error::{Result, ScanError};
use crate::git::GitCli;
use crate::model::{EventWindow, RepoReport};
use crate::roster::RosterEntry;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub force: bool,
    pub update: bool,
    pub jobs: usize,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            force: false,
            update: true,
            jobs: 1,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoFailure {
    pub repo_id: String,
    pub kind: &'static str,
    pub message: String,
}

/// Outcome of a whole roster. `reports` holds every repository that has a
/// valid report (fresh or cached), sorted by identifier; failed repositories
/// appear only in `failures`.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<RepoReport>,
    pub fresh: usize,
    pub cached: usize,
    pub failures: Vec<RepoFailure>,
}

pub fn run_batch(
    entries: Vec<RosterEntry>,
    window: &EventWindow,
    dirs: &WorkDirs,
    cache: &mut Cache,
    git: &GitCli,
    opts: &BatchOptions,
) -> Result<BatchReport> {
    let mut batch = BatchReport::default();
    let mut pending: Vec<RepoJob> = Vec::new();

    for entry in entries {
        let repo_id = entry.repo_id.clone();
        let job = match prepare_job(entry, window) {
            Ok(job) => job,
            Err(e) => {
                record_failure(&mut batch.failures, &repo_id, &e);
                continue;
            }
        };

        if !opts.force {
            match cache.get_report(&repo_id) {
                Ok(Some(report)) => {
                    info!("Skipping {repo_id} (cached metrics found).");
                    batch.reports.push(report);
                    batch.cached += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(repo_id = %repo_id, "Discarding unreadable cached report: {e}");
                    cache.remove_report(&repo_id)?;
                }
            }
        }
        pending.push(job);
    }

    let pb = progress_bar(pending.len(), opts.show_progress);
    let run = |job: &RepoJob| -> (String, Result<RepoReport>) {
        pb.set_message(job.entry.repo_id.clone());
        let result = run_repo(job, dirs, git, opts.update);
        pb.inc(1);
        (job.entry.repo_id.clone(), result)
    };

    let results: Vec<(String, Result<RepoReport>)> = if opts.jobs <= 1 {
        pending.iter().map(run).collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(opts.jobs).build() {
            Ok(pool) => pool.install(|| pending.par_iter().map(run).collect()),
            Err(e) => {
                warn!("Thread pool unavailable ({e}); scanning sequentially.");
                pending.iter().map(run).collect()
            }
        }
    };
    pb.finish_and_clear();

    let mut fresh = Vec::new();
    for (repo_id, result) in results {
        match result {
            Ok(report) => fresh.push(report),
            Err(e) => record_failure(&mut batch.failures, &repo_id, &e),
        }
    }

    if let Err(e) = cache.store_reports(&fresh) {
        error!("Failed to store reports in cache: {e}");
    }

    batch.fresh = fresh.len();
    batch.reports.extend(fresh);
    batch.reports.sort_by(|a, b| a.repo_id.cmp(&b.repo_id));
    batch.failures.sort_by(|a, b| a.repo_id.cmp(&b.repo_id));
    Ok(batch)
}

fn record_failure(failures: &mut Vec<RepoFailure>, repo_id: &str, err: &ScanError) {
    warn!(
        repo_id,
        kind = err.kind(),
        repo_local = err.is_repo_local(),
        "Failed processing {repo_id}: {err}"
    );
    failures.push(RepoFailure {
        repo_id: repo_id.to_string(),
        kind: err.kind(),
        message: err.to_string(),
    });
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}
