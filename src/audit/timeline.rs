use super::anomaly::is_bulk_commit;
use crate::model::{ClassifiedCommit, Commit, EventWindow};
use crate::util::minutes_between;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub commits: Vec<ClassifiedCommit>,
    pub gaps_all: Vec<f64>,
    /// Minutes between consecutive in-window commits, skipping anything
    /// outside the window in between.
    pub gaps_in_window: Vec<f64>,
}

pub fn classify(commits: &[Commit], window: &EventWindow) -> Timeline {
    let mut timeline = Timeline {
        commits: Vec::with_capacity(commits.len()),
        ..Timeline::default()
    };
    let mut prev: Option<DateTime<Utc>> = None;
    let mut prev_in_window: Option<DateTime<Utc>> = None;

    for commit in commits {
        let at = commit.author_time;

        let minutes_since_prev_commit = prev.map(|p| minutes_between(&at, &p));
        if let Some(gap) = minutes_since_prev_commit {
            timeline.gaps_all.push(gap);
        }

        let is_during_event = window.contains(&at);
        if is_during_event {
            if let Some(p) = prev_in_window {
                timeline.gaps_in_window.push(minutes_between(&at, &p));
            }
            prev_in_window = Some(at);
        }

        timeline.commits.push(ClassifiedCommit {
            commit: commit.clone(),
            is_merge: commit.is_merge(),
            minutes_since_prev_commit,
            minutes_since_t0: minutes_between(&at, &window.t0),
            is_before_t0: window.is_before(&at),
            is_during_event,
            is_after_t1: window.is_after(&at),
            flag_bulk_commit: is_bulk_commit(commit),
        });
        prev = Some(at);
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at_minutes(offset: i64) -> Commit {
        Commit::new(
            format!("c{offset}"),
            t0() + Duration::minutes(offset),
            vec![],
            "work",
        )
    }

    #[test]
    fn preserves_length_and_order() {
        let commits: Vec<_> = [-30, 0, 45, 90].into_iter().map(at_minutes).collect();
        let window = EventWindow::new(t0(), None).unwrap();
        let timeline = classify(&commits, &window);
        let shas: Vec<_> = timeline.commits.iter().map(|c| c.commit.sha.as_str()).collect();
        assert_eq!(shas, vec!["c-30", "c0", "c45", "c90"]);
    }

    #[test]
    fn exactly_one_class_per_commit_with_bounds_inclusive() {
        let t1_offset = 24 * 60;
        let commits: Vec<_> = [-1, 0, 600, t1_offset, t1_offset + 1]
            .into_iter()
            .map(at_minutes)
            .collect();
        let window = EventWindow::new(t0(), Some(t0() + Duration::minutes(t1_offset))).unwrap();
        let timeline = classify(&commits, &window);

        for c in &timeline.commits {
            let classes = [c.is_before_t0, c.is_during_event, c.is_after_t1];
            assert_eq!(classes.iter().filter(|b| **b).count(), 1, "{}", c.commit.sha);
        }
        let during: Vec<_> = timeline.commits.iter().map(|c| c.is_during_event).collect();
        assert_eq!(during, vec![false, true, true, true, false]);
        assert!(timeline.commits[4].is_after_t1);
    }

    #[test]
    fn first_commit_has_no_previous_gap() {
        let commits: Vec<_> = [-10, 5, 35].into_iter().map(at_minutes).collect();
        let window = EventWindow::new(t0(), None).unwrap();
        let timeline = classify(&commits, &window);

        assert_eq!(timeline.commits[0].minutes_since_prev_commit, None);
        assert_eq!(timeline.commits[1].minutes_since_prev_commit, Some(15.0));
        assert_eq!(timeline.commits[2].minutes_since_prev_commit, Some(30.0));
        assert_eq!(timeline.commits[0].minutes_since_t0, -10.0);
        assert_eq!(timeline.gaps_all, vec![15.0, 30.0]);
    }

    #[test]
    fn single_in_window_commit_yields_no_window_gap() {
        let commits: Vec<_> = [-120, 60, 180].into_iter().map(at_minutes).collect();
        let window = EventWindow::new(t0(), Some(t0() + Duration::hours(2))).unwrap();
        let timeline = classify(&commits, &window);

        assert_eq!(timeline.gaps_all, vec![180.0, 120.0]);
        assert!(timeline.gaps_in_window.is_empty());
    }

    #[test]
    fn in_window_reference_is_previous_in_window_commit() {
        // Histories can be out of time order (rebases, clock skew), so an
        // out-of-window commit may sit between two in-window ones.
        let commits: Vec<_> = [10, -50, 40].into_iter().map(at_minutes).collect();
        let window = EventWindow::new(t0(), None).unwrap();
        let timeline = classify(&commits, &window);

        assert_eq!(timeline.gaps_all, vec![-60.0, 90.0]);
        assert_eq!(timeline.gaps_in_window, vec![30.0]);
    }
}
