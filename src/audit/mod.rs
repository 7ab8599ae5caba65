//! Commit classification, anomaly flags and aggregation for one repository.
//!
//! Every stage is a pure function of the commit sequence and the event
//! window; running [`audit`] twice on the same input yields identical output.

pub mod aggregate;
pub mod anomaly;
pub mod timeline;

pub use aggregate::{summarize, time_distribution, HourBucket, HOUR_BUCKET_EDGES};
pub use anomaly::{is_bulk_commit, repo_flags, BULK_FILES_THRESHOLD, BULK_INSERTION_THRESHOLD};
pub use timeline::{classify, Timeline};

use crate::model::{Commit, EventWindow, Metrics};

#[derive(Debug, Clone, PartialEq)]
pub struct Audit {
    pub timeline: Timeline,
    pub metrics: Metrics,
}

pub fn audit(commits: &[Commit], window: &EventWindow) -> Audit {
    let timeline = classify(commits, window);
    let metrics = Metrics {
        summary: summarize(&timeline),
        time_distribution: time_distribution(&timeline.commits, &window.t0),
        flags: repo_flags(&timeline.commits),
    };
    Audit { timeline, metrics }
}
