use super::WorkDirs;
use crate::audit::audit;
use crate::error::Result;
use crate::git::{collect_commits, ensure_cloned, GitCli, GitRepo};
use crate::model::{EventWindow, RepoReport, SCHEMA_VERSION};
use crate::report::write_repo_outputs;
use crate::roster::RosterEntry;
use crate::util::parse_iso_datetime;
use chrono::Utc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RepoJob {
    pub entry: RosterEntry,
    pub window: EventWindow,
}

/// Applies the entry's own `t0` override, if any. An unparsable override
/// only invalidates this repository.
pub fn prepare_job(entry: RosterEntry, global: &EventWindow) -> Result<RepoJob> {
    let window = match entry.t0.as_deref() {
        Some(raw) => global.with_start(parse_iso_datetime(raw)?),
        None => *global,
    };
    Ok(RepoJob { entry, window })
}

pub fn run_repo(job: &RepoJob, dirs: &WorkDirs, git: &GitCli, update: bool) -> Result<RepoReport> {
    let entry = &job.entry;
    let repo_dir = ensure_cloned(git, &entry.repo_id, &entry.clone_url, &dirs.repos, update)?;

    let repo = GitRepo::open(Some(&repo_dir))?;
    let default_branch = repo.default_branch()?;
    let commits = collect_commits(git, &repo_dir, &default_branch)?;
    let audit = audit(&commits, &job.window);

    let report = RepoReport {
        version: SCHEMA_VERSION,
        repo_id: entry.repo_id.clone(),
        repo: entry.repo.clone(),
        remote_url: repo.remote_url(),
        default_branch,
        t0: job.window.t0,
        t1: job.window.t1,
        generated_at: Utc::now(),
        metrics: audit.metrics,
    };

    write_repo_outputs(&dirs.metrics, &report, &audit.timeline.commits)?;
    info!("Processed {} with {} commits.", entry.repo_id, commits.len());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use chrono::TimeZone;

    fn entry(t0: Option<&str>) -> RosterEntry {
        RosterEntry {
            repo_id: "team-a".into(),
            repo: "acme/a".into(),
            clone_url: "https://github.com/acme/a.git".into(),
            t0: t0.map(str::to_owned),
        }
    }

    fn global() -> EventWindow {
        EventWindow::parse("2024-03-01T09:00:00Z", Some("2024-03-03T09:00:00Z")).unwrap()
    }

    #[test]
    fn override_replaces_start_and_keeps_global_end() {
        let job = prepare_job(entry(Some("2024-03-01T12:00:00+00:00")), &global()).unwrap();
        assert_eq!(job.window.t0, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(job.window.t1, global().t1);
    }

    #[test]
    fn override_after_t1_is_still_audited() {
        let job = prepare_job(entry(Some("2024-03-04T09:00:00Z")), &global()).unwrap();
        assert_eq!(job.window.t0, Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());

        let commit = crate::model::Commit::new(
            "abc",
            Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
            vec![],
            "work",
        );
        let metrics = audit(&[commit], &job.window).metrics;
        assert_eq!(metrics.summary.total_commits, 1);
        assert_eq!(metrics.summary.total_commits_during_event, 0);
        assert!(metrics.flags.has_commits_before_t0);
        assert!(!metrics.flags.has_large_initial_commit_after_t0);
    }

    #[test]
    fn missing_override_uses_global_window() {
        let job = prepare_job(entry(None), &global()).unwrap();
        assert_eq!(job.window, global());
    }

    #[test]
    fn bad_override_is_invalid_window() {
        let err = prepare_job(entry(Some("soon")), &global()).unwrap_err();
        assert!(matches!(err, ScanError::InvalidWindow(_)));
        assert!(err.is_repo_local());
    }
}
