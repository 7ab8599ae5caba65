use crate::error::Result;
use crate::model::{ClassifiedCommit, RepoReport};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "metrics_summary.csv";

pub fn report_json_path(metrics_dir: &Path, repo_id: &str) -> PathBuf {
    metrics_dir.join(format!("{repo_id}.json"))
}

pub fn commits_csv_path(metrics_dir: &Path, repo_id: &str) -> PathBuf {
    metrics_dir.join(format!("{repo_id}_commits.csv"))
}

#[derive(Debug, Serialize)]
struct CommitRow<'a> {
    repo_id: &'a str,
    seq_index: usize,
    sha: &'a str,
    author_time_iso: String,
    minutes_since_prev_commit: Option<String>,
    minutes_since_t0: String,
    insertions: u64,
    deletions: u64,
    files_changed: u32,
    is_merge: u8,
    is_before_t0: u8,
    is_during_event: u8,
    is_after_t1: u8,
    flag_bulk_commit: u8,
    subject: &'a str,
}

impl<'a> CommitRow<'a> {
    fn new(repo_id: &'a str, seq_index: usize, c: &'a ClassifiedCommit) -> Self {
        Self {
            repo_id,
            seq_index,
            sha: &c.commit.sha,
            author_time_iso: c.commit.author_time.to_rfc3339(),
            minutes_since_prev_commit: c.minutes_since_prev_commit.map(|m| format!("{m:.2}")),
            minutes_since_t0: format!("{:.2}", c.minutes_since_t0),
            insertions: c.commit.insertions,
            deletions: c.commit.deletions,
            files_changed: c.commit.files_changed,
            is_merge: c.is_merge.into(),
            is_before_t0: c.is_before_t0.into(),
            is_during_event: c.is_during_event.into(),
            is_after_t1: c.is_after_t1.into(),
            flag_bulk_commit: c.flag_bulk_commit.into(),
            subject: &c.commit.subject,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub repo_id: String,
    pub repo: String,
    pub default_branch: String,
    pub t0: String,
    pub t1: Option<String>,
    pub total_commits: usize,
    pub total_commits_before_t0: usize,
    pub total_commits_during_event: usize,
    pub total_commits_after_t1: usize,
    pub total_loc_added: u64,
    pub total_loc_deleted: u64,
    pub max_loc_added_single_commit: u64,
    pub max_files_changed_single_commit: u32,
    pub median_minutes_between_commits: Option<f64>,
    pub median_minutes_between_commits_during_event: Option<f64>,
    pub commits_0_3h: usize,
    pub commits_3_6h: usize,
    pub commits_6_12h: usize,
    pub commits_12_24h: usize,
    pub commits_after_24h: usize,
    pub has_commits_before_t0: u8,
    pub has_bulk_commits: u8,
    pub has_large_initial_commit_after_t0: u8,
    pub has_merge_commits: u8,
}

impl From<&RepoReport> for SummaryRow {
    fn from(r: &RepoReport) -> Self {
        let s = &r.metrics.summary;
        let d = &r.metrics.time_distribution;
        let f = &r.metrics.flags;
        Self {
            repo_id: r.repo_id.clone(),
            repo: r.repo.clone(),
            default_branch: r.default_branch.clone(),
            t0: r.t0.to_rfc3339(),
            t1: r.t1.map(|t| t.to_rfc3339()),
            total_commits: s.total_commits,
            total_commits_before_t0: s.total_commits_before_t0,
            total_commits_during_event: s.total_commits_during_event,
            total_commits_after_t1: s.total_commits_after_t1,
            total_loc_added: s.total_loc_added,
            total_loc_deleted: s.total_loc_deleted,
            max_loc_added_single_commit: s.max_loc_added_single_commit,
            max_files_changed_single_commit: s.max_files_changed_single_commit,
            median_minutes_between_commits: s.median_minutes_between_commits,
            median_minutes_between_commits_during_event: s
                .median_minutes_between_commits_during_event,
            commits_0_3h: d.commits_0_3h,
            commits_3_6h: d.commits_3_6h,
            commits_6_12h: d.commits_6_12h,
            commits_12_24h: d.commits_12_24h,
            commits_after_24h: d.commits_after_24h,
            has_commits_before_t0: f.has_commits_before_t0.into(),
            has_bulk_commits: f.has_bulk_commits.into(),
            has_large_initial_commit_after_t0: f.has_large_initial_commit_after_t0.into(),
            has_merge_commits: f.has_merge_commits.into(),
        }
    }
}

pub fn write_commit_csv<W: Write>(out: W, repo_id: &str, commits: &[ClassifiedCommit]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for (idx, c) in commits.iter().enumerate() {
        wtr.serialize(CommitRow::new(repo_id, idx, c))?;
    }
    if commits.is_empty() {
        wtr.write_record(COMMIT_CSV_HEADER)?;
    }
    wtr.flush()?;
    Ok(())
}

const COMMIT_CSV_HEADER: [&str; 15] = [
    "repo_id",
    "seq_index",
    "sha",
    "author_time_iso",
    "minutes_since_prev_commit",
    "minutes_since_t0",
    "insertions",
    "deletions",
    "files_changed",
    "is_merge",
    "is_before_t0",
    "is_during_event",
    "is_after_t1",
    "flag_bulk_commit",
    "subject",
];

pub fn write_summary_csv<W: Write>(out: W, rows: &[SummaryRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `<id>_commits.csv` and `<id>.json`. Both go to temporary names
/// first and are only renamed into place once both were written, so a failed
/// repository never leaves one of the pair behind.
pub fn write_repo_outputs(
    metrics_dir: &Path,
    report: &RepoReport,
    commits: &[ClassifiedCommit],
) -> Result<()> {
    std::fs::create_dir_all(metrics_dir)?;

    let csv_path = commits_csv_path(metrics_dir, &report.repo_id);
    let json_path = report_json_path(metrics_dir, &report.repo_id);

    let csv_tmp = write_temp(&csv_path, |f| write_commit_csv(f, &report.repo_id, commits))?;
    let json_tmp = match write_temp(&json_path, |f| {
        serde_json::to_writer_pretty(&mut *f, report)?;
        writeln!(f)?;
        Ok(())
    }) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = std::fs::remove_file(&csv_tmp);
            return Err(e);
        }
    };

    std::fs::rename(&csv_tmp, &csv_path)?;
    std::fs::rename(&json_tmp, &json_path)?;
    Ok(())
}

pub fn write_summary_file(summary_dir: &Path, rows: &[SummaryRow]) -> Result<PathBuf> {
    std::fs::create_dir_all(summary_dir)?;
    let path = summary_dir.join(SUMMARY_FILE);
    let tmp = write_temp(&path, |f| write_summary_csv(f, rows))?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_temp<F>(path: &Path, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let tmp = temp_path(path);
    let mut file = File::create(&tmp)?;
    if let Err(e) = write(&mut file).and_then(|_| Ok(file.sync_all()?)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit;
    use crate::model::{Commit, EventWindow, SCHEMA_VERSION};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn sample() -> (RepoReport, Vec<ClassifiedCommit>) {
        let mut first = Commit::new("aaa", t0() - Duration::minutes(30), vec![], "scaffold, with comma");
        first.insertions = 12;
        first.files_changed = 3;
        let second = Commit::new("bbb", t0() + Duration::minutes(45), vec!["aaa".into()], "feature");
        let window = EventWindow::new(t0(), None).unwrap();
        let audit = audit(&[first, second], &window);
        let report = RepoReport {
            version: SCHEMA_VERSION,
            repo_id: "team-a".into(),
            repo: "acme/a".into(),
            remote_url: "https://github.com/acme/a.git".into(),
            default_branch: "main".into(),
            t0: window.t0,
            t1: window.t1,
            generated_at: t0(),
            metrics: audit.metrics,
        };
        (report, audit.timeline.commits)
    }

    #[test]
    fn commit_csv_rows_are_indexed_and_flagged() {
        let (_, commits) = sample();
        let mut buf = Vec::new();
        write_commit_csv(&mut buf, "team-a", &commits).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], COMMIT_CSV_HEADER.join(","));
        assert_eq!(
            lines[1],
            "team-a,0,aaa,2024-03-01T08:30:00+00:00,,-30.00,12,0,3,0,1,0,0,0,\"scaffold, with comma\""
        );
        assert_eq!(
            lines[2],
            "team-a,1,bbb,2024-03-01T09:45:00+00:00,75.00,45.00,0,0,0,0,0,1,0,0,feature"
        );
    }

    #[test]
    fn empty_commit_csv_still_has_header() {
        let mut buf = Vec::new();
        write_commit_csv(&mut buf, "x", &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), COMMIT_CSV_HEADER.join(","));
    }

    #[test]
    fn summary_row_uses_empty_cells_for_missing_values() {
        let (report, _) = sample();
        let row = SummaryRow::from(&report);
        assert_eq!(row.has_commits_before_t0, 1);
        assert_eq!(row.t1, None);

        let mut buf = Vec::new();
        write_summary_csv(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let data = text.lines().nth(1).unwrap();
        assert!(data.starts_with("team-a,acme/a,main,2024-03-01T09:00:00+00:00,,2,1,1,0,12,0,12,3,75.0,,"));
    }

    #[test]
    fn repo_outputs_land_under_metrics_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (report, commits) = sample();
        write_repo_outputs(dir.path(), &report, &commits).unwrap();

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(report_json_path(dir.path(), "team-a")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["repo_id"], "team-a");
        assert_eq!(json["summary"]["total_commits"], 2);
        assert_eq!(json["flags"]["has_commits_before_t0"], true);
        assert!(json["t1"].is_null());
        assert!(commits_csv_path(dir.path(), "team-a").exists());
        assert!(!dir.path().join("team-a.json.tmp").exists());
        assert!(!dir.path().join("team-a_commits.csv.tmp").exists());
    }

    #[test]
    fn failed_json_leaves_no_commit_csv() {
        let dir = tempfile::tempdir().unwrap();
        let (report, commits) = sample();
        std::fs::create_dir(dir.path().join("team-a.json.tmp")).unwrap();

        assert!(write_repo_outputs(dir.path(), &report, &commits).is_err());
        assert!(!commits_csv_path(dir.path(), "team-a").exists());
        assert!(!dir.path().join("team-a_commits.csv.tmp").exists());
        assert!(!report_json_path(dir.path(), "team-a").exists());
    }
}
