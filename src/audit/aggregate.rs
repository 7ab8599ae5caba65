use super::timeline::Timeline;
use crate::model::{ClassifiedCommit, Summary, TimeDistribution};
use crate::util::{hours_between, median};
use chrono::{DateTime, Utc};

/// Lower edges, in hours since `t0`, of the histogram buckets after the
/// first. Intervals are half-open: a commit exactly on an edge belongs to the
/// later bucket.
pub const HOUR_BUCKET_EDGES: [f64; 4] = [3.0, 6.0, 12.0, 24.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourBucket {
    ZeroToThree,
    ThreeToSix,
    SixToTwelve,
    TwelveToTwentyFour,
    AfterTwentyFour,
}

impl HourBucket {
    /// `None` for negative offsets, which only pre-window commits have.
    pub fn for_hours(hours: f64) -> Option<Self> {
        if hours < 0.0 {
            return None;
        }
        let [three, six, twelve, day] = HOUR_BUCKET_EDGES;
        Some(if hours < three {
            HourBucket::ZeroToThree
        } else if hours < six {
            HourBucket::ThreeToSix
        } else if hours < twelve {
            HourBucket::SixToTwelve
        } else if hours < day {
            HourBucket::TwelveToTwentyFour
        } else {
            HourBucket::AfterTwentyFour
        })
    }
}

impl TimeDistribution {
    fn record(&mut self, bucket: HourBucket) {
        let slot = match bucket {
            HourBucket::ZeroToThree => &mut self.commits_0_3h,
            HourBucket::ThreeToSix => &mut self.commits_3_6h,
            HourBucket::SixToTwelve => &mut self.commits_6_12h,
            HourBucket::TwelveToTwentyFour => &mut self.commits_12_24h,
            HourBucket::AfterTwentyFour => &mut self.commits_after_24h,
        };
        *slot += 1;
    }
}

/// Totals span every commit, including pre-window history, so that an
/// imported project shows up in the line counts.
pub fn summarize(timeline: &Timeline) -> Summary {
    let commits = &timeline.commits;
    let count = |pred: fn(&ClassifiedCommit) -> bool| commits.iter().filter(|c| pred(c)).count();

    Summary {
        total_commits: commits.len(),
        total_commits_before_t0: count(|c| c.is_before_t0),
        total_commits_during_event: count(|c| c.is_during_event),
        total_commits_after_t1: count(|c| c.is_after_t1),
        total_loc_added: commits.iter().map(|c| c.commit.insertions).sum(),
        total_loc_deleted: commits.iter().map(|c| c.commit.deletions).sum(),
        max_loc_added_single_commit: commits
            .iter()
            .map(|c| c.commit.insertions)
            .max()
            .unwrap_or(0),
        max_files_changed_single_commit: commits
            .iter()
            .map(|c| c.commit.files_changed)
            .max()
            .unwrap_or(0),
        median_minutes_between_commits: median(&timeline.gaps_all),
        median_minutes_between_commits_during_event: median(&timeline.gaps_in_window),
    }
}

pub fn time_distribution(commits: &[ClassifiedCommit], t0: &DateTime<Utc>) -> TimeDistribution {
    let mut dist = TimeDistribution::default();
    for c in commits.iter().filter(|c| c.is_during_event) {
        if let Some(bucket) = HourBucket::for_hours(hours_between(&c.commit.author_time, t0)) {
            dist.record(bucket);
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::timeline::classify;
    use crate::model::{Commit, EventWindow};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn commit(minutes: i64, insertions: u64, deletions: u64, files: u32) -> Commit {
        let mut c = Commit::new(
            format!("m{minutes}"),
            t0() + Duration::minutes(minutes),
            vec![],
            "x",
        );
        c.insertions = insertions;
        c.deletions = deletions;
        c.files_changed = files;
        c
    }

    #[test]
    fn bucket_edges_are_half_open() {
        assert_eq!(HourBucket::for_hours(-0.1), None);
        assert_eq!(HourBucket::for_hours(0.0), Some(HourBucket::ZeroToThree));
        assert_eq!(HourBucket::for_hours(2.99), Some(HourBucket::ZeroToThree));
        assert_eq!(HourBucket::for_hours(3.0), Some(HourBucket::ThreeToSix));
        assert_eq!(HourBucket::for_hours(6.0), Some(HourBucket::SixToTwelve));
        assert_eq!(HourBucket::for_hours(12.0), Some(HourBucket::TwelveToTwentyFour));
        assert_eq!(HourBucket::for_hours(24.0), Some(HourBucket::AfterTwentyFour));
        assert_eq!(HourBucket::for_hours(500.0), Some(HourBucket::AfterTwentyFour));
    }

    #[test]
    fn three_commit_scenario() {
        let commits = vec![commit(-60, 1, 0, 1), commit(60, 1, 0, 1), commit(300, 1, 0, 1)];
        let window = EventWindow::new(t0(), Some(t0() + Duration::hours(24))).unwrap();
        let timeline = classify(&commits, &window);
        let summary = summarize(&timeline);
        let dist = time_distribution(&timeline.commits, &window.t0);

        assert_eq!(summary.total_commits_before_t0, 1);
        assert_eq!(summary.total_commits_during_event, 2);
        assert_eq!(summary.total_commits_after_t1, 0);
        assert_eq!(
            dist,
            TimeDistribution {
                commits_0_3h: 1,
                commits_3_6h: 1,
                ..TimeDistribution::default()
            }
        );
        assert_eq!(summary.median_minutes_between_commits, Some(180.0));
        assert_eq!(summary.median_minutes_between_commits_during_event, Some(240.0));
    }

    #[test]
    fn totals_and_maxima_are_independent() {
        let commits = vec![
            commit(-30, 1200, 10, 2),
            commit(30, 40, 5, 70),
            commit(90, 8, 100, 1),
        ];
        let window = EventWindow::new(t0(), None).unwrap();
        let summary = summarize(&classify(&commits, &window));

        assert_eq!(summary.total_loc_added, 1248);
        assert_eq!(summary.total_loc_deleted, 115);
        assert_eq!(summary.max_loc_added_single_commit, 1200);
        assert_eq!(summary.max_files_changed_single_commit, 70);
    }

    #[test]
    fn single_commit_has_no_medians() {
        let window = EventWindow::new(t0(), None).unwrap();
        let summary = summarize(&classify(&[commit(5, 1, 1, 1)], &window));
        assert_eq!(summary.total_commits, 1);
        assert_eq!(summary.median_minutes_between_commits, None);
        assert_eq!(summary.median_minutes_between_commits_during_event, None);
    }

    #[test]
    fn empty_history_summarizes_to_zeroes() {
        let window = EventWindow::new(t0(), None).unwrap();
        assert_eq!(summarize(&classify(&[], &window)), Summary::default());
    }
}
