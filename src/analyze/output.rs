use crate::audit::Audit;
use crate::git::GitRepo;
use crate::model::{AnalyzeOutput, ClassifiedCommit, EventWindow, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;
use serde::Serialize;

pub fn output_json(audit: &Audit, repo: &GitRepo, branch: &str, window: &EventWindow) -> Result<()> {
    let output = AnalyzeOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: repo.path().to_string_lossy().to_string(),
        branch: branch.to_string(),
        t0: window.t0,
        t1: window.t1,
        metrics: audit.metrics.clone(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[derive(Serialize)]
struct IndexedCommit<'a> {
    seq_index: usize,
    #[serde(flatten)]
    commit: &'a ClassifiedCommit,
}

fn ndjson_lines(commits: &[ClassifiedCommit]) -> Result<Vec<String>> {
    let lines = commits
        .iter()
        .enumerate()
        .map(|(seq_index, commit)| serde_json::to_string(&IndexedCommit { seq_index, commit }))
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(lines)
}

pub fn output_ndjson(commits: &[ClassifiedCommit]) -> Result<()> {
    for line in ndjson_lines(commits)? {
        println!("{line}");
    }
    Ok(())
}

fn phase(c: &ClassifiedCommit) -> console::StyledObject<&'static str> {
    if c.is_before_t0 {
        style("before").yellow()
    } else if c.is_after_t1 {
        style("after").magenta()
    } else {
        style("during").green()
    }
}

pub fn output_table(audit: &Audit, branch: &str, window: &EventWindow) -> Result<()> {
    let commits = &audit.timeline.commits;
    if commits.is_empty() {
        println!("No commits on {branch}");
        return Ok(());
    }

    match window.t1 {
        Some(t1) => println!("Event window {} to {}", window.t0.to_rfc3339(), t1.to_rfc3339()),
        None => println!("Event window from {}", window.t0.to_rfc3339()),
    }
    println!("{}", style(format!("Commits on {branch}")).bold());
    println!("{}", "─".repeat(80));

    for c in commits {
        let bulk = if c.flag_bulk_commit {
            style("BULK").red().bold().to_string()
        } else {
            String::new()
        };
        let sha: String = c.commit.sha.chars().take(8).collect();
        println!(
            "{} {:>6} {:>+9.1}m {:>6}+ {:>6}- {:>4}f {} {}",
            style(sha).dim(),
            phase(c),
            c.minutes_since_t0,
            c.commit.insertions,
            c.commit.deletions,
            c.commit.files_changed,
            c.commit.subject,
            bulk
        );
    }

    let s = &audit.metrics.summary;
    let d = &audit.metrics.time_distribution;
    let f = &audit.metrics.flags;
    println!("{}", "─".repeat(80));
    println!(
        "{} commits: {} before, {} during, {} after",
        s.total_commits, s.total_commits_before_t0, s.total_commits_during_event, s.total_commits_after_t1
    );
    println!("Lines: +{} -{}", s.total_loc_added, s.total_loc_deleted);
    if let Some(m) = s.median_minutes_between_commits {
        println!("Median gap: {m:.1} min");
    }
    println!(
        "Hours since t0: 0-3h {}, 3-6h {}, 6-12h {}, 12-24h {}, >24h {}",
        d.commits_0_3h, d.commits_3_6h, d.commits_6_12h, d.commits_12_24h, d.commits_after_24h
    );

    let raised: Vec<&str> = [
        (f.has_commits_before_t0, "commits before t0"),
        (f.has_bulk_commits, "bulk commits"),
        (f.has_large_initial_commit_after_t0, "large initial commit"),
        (f.has_merge_commits, "merge commits"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .collect();
    if !raised.is_empty() {
        println!("{} {}", style("Flags:").red().bold(), raised.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit;
    use crate::model::Commit;
    use chrono::{Duration, TimeZone};

    #[test]
    fn ndjson_rows_carry_zero_based_index() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let commits = vec![
            Commit::new("aaa", t0, vec![], "first"),
            Commit::new("bbb", t0 + Duration::minutes(30), vec!["aaa".into()], "second"),
        ];
        let window = EventWindow::new(t0, None).unwrap();
        let lines = ndjson_lines(&audit(&commits, &window).timeline.commits).unwrap();

        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["seq_index"], 1);
        assert_eq!(second["sha"], "bbb");
        assert_eq!(second["minutes_since_prev_commit"], 30.0);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["seq_index"], 0);
    }
}
