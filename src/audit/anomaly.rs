//! Bulk-commit heuristics and repository-level integrity flags.
//!
//! The thresholds are fixed so that flags stay comparable across every
//! repository in a run. Flags are advisory; nothing here rejects a
//! submission.

use crate::model::{ClassifiedCommit, Commit, RepoFlags};

pub const BULK_INSERTION_THRESHOLD: u64 = 1000;
pub const BULK_FILES_THRESHOLD: u32 = 50;

pub fn is_bulk_commit(commit: &Commit) -> bool {
    commit.insertions >= BULK_INSERTION_THRESHOLD || commit.files_changed >= BULK_FILES_THRESHOLD
}

pub fn repo_flags(commits: &[ClassifiedCommit]) -> RepoFlags {
    // Only the very first in-window commit counts here; a bulk commit later
    // in the window is reported through `has_bulk_commits` instead.
    let has_large_initial_commit_after_t0 = commits
        .iter()
        .find(|c| c.is_during_event)
        .is_some_and(|c| c.flag_bulk_commit);

    RepoFlags {
        has_commits_before_t0: commits.iter().any(|c| c.is_before_t0),
        has_bulk_commits: commits
            .iter()
            .any(|c| c.is_during_event && c.flag_bulk_commit),
        has_large_initial_commit_after_t0,
        has_merge_commits: commits.iter().any(|c| c.is_merge),
    }
}
