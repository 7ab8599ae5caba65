use crate::error::{Result, ScanError};
use crate::util::parse_iso_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub author_time: DateTime<Utc>,
    pub author_name: String,
    pub author_email: String,
    pub parent_shas: Vec<String>,
    pub subject: String,
    pub insertions: u64,
    pub deletions: u64,
    pub files_changed: u32,
}

impl Commit {
    pub fn new(
        sha: impl Into<String>,
        author_time: DateTime<Utc>,
        parent_shas: Vec<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            sha: sha.into(),
            author_time,
            author_name: String::new(),
            author_email: String::new(),
            parent_shas,
            subject: subject.into(),
            insertions: 0,
            deletions: 0,
            files_changed: 0,
        }
    }

    pub fn is_merge(&self) -> bool {
        self.parent_shas.len() > 1
    }

    /// Adds one numstat entry. Binary files carry no line counts but still
    /// count as a changed file.
    pub fn add_file_change(&mut self, insertions: Option<u64>, deletions: Option<u64>) {
        self.insertions += insertions.unwrap_or(0);
        self.deletions += deletions.unwrap_or(0);
        self.files_changed += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCommit {
    #[serde(flatten)]
    pub commit: Commit,
    pub is_merge: bool,
    pub minutes_since_prev_commit: Option<f64>,
    pub minutes_since_t0: f64,
    pub is_before_t0: bool,
    pub is_during_event: bool,
    pub is_after_t1: bool,
    pub flag_bulk_commit: bool,
}

/// The `[t0, t1]` interval (or `[t0, ∞)` when `t1` is absent) that counts as
/// "during the event". Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    pub t0: DateTime<Utc>,
    pub t1: Option<DateTime<Utc>>,
}

impl EventWindow {
    pub fn new(t0: DateTime<Utc>, t1: Option<DateTime<Utc>>) -> Result<Self> {
        if let Some(end) = t1 {
            if end < t0 {
                return Err(ScanError::InvalidWindow(format!(
                    "t1 ({}) is before t0 ({})",
                    end.to_rfc3339(),
                    t0.to_rfc3339()
                )));
            }
        }
        Ok(Self { t0, t1 })
    }

    pub fn parse(t0: &str, t1: Option<&str>) -> Result<Self> {
        let start = parse_iso_datetime(t0)?;
        let end = t1.map(parse_iso_datetime).transpose()?;
        Self::new(start, end)
    }

    /// Same window with a per-repository start; `t1` stays global. A start
    /// past `t1` is kept as given: nothing is in-window and the flags still
    /// apply.
    pub fn with_start(&self, t0: DateTime<Utc>) -> Self {
        if matches!(self.t1, Some(end) if end < t0) {
            warn!(
                "t0 override {} is after t1; no commit can fall in the window",
                t0.to_rfc3339()
            );
        }
        Self { t0, t1: self.t1 }
    }

    pub fn is_before(&self, ts: &DateTime<Utc>) -> bool {
        ts < &self.t0
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        if ts < &self.t0 {
            return false;
        }
        match self.t1 {
            Some(end) => ts <= &end,
            None => true,
        }
    }

    pub fn is_after(&self, ts: &DateTime<Utc>) -> bool {
        matches!(self.t1, Some(end) if ts > &end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
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
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDistribution {
    pub commits_0_3h: usize,
    pub commits_3_6h: usize,
    pub commits_6_12h: usize,
    pub commits_12_24h: usize,
    pub commits_after_24h: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFlags {
    pub has_commits_before_t0: bool,
    pub has_bulk_commits: bool,
    pub has_large_initial_commit_after_t0: bool,
    pub has_merge_commits: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub summary: Summary,
    pub time_distribution: TimeDistribution,
    pub flags: RepoFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoReport {
    pub version: u32,
    pub repo_id: String,
    pub repo: String,
    pub remote_url: String,
    pub default_branch: String,
    pub t0: DateTime<Utc>,
    pub t1: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub t0: DateTime<Utc>,
    pub t1: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub metrics: Metrics,
}
