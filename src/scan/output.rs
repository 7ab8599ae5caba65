use super::batch::{BatchReport, RepoFailure};
use crate::model::{RepoReport, SCHEMA_VERSION};
use crate::report::SummaryRow;
use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct ScanOutput<'a> {
    version: u32,
    generated_at: DateTime<Utc>,
    fresh: usize,
    cached: usize,
    reports: &'a [RepoReport],
    failures: &'a [RepoFailure],
}

pub fn output_json(batch: &BatchReport) -> Result<()> {
    let output = ScanOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        fresh: batch.fresh,
        cached: batch.cached,
        reports: &batch.reports,
        failures: &batch.failures,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn mark(flag: u8) -> String {
    if flag == 1 {
        style("yes").red().bold().to_string()
    } else {
        style("-").dim().to_string()
    }
}

pub fn output_table(rows: &[SummaryRow], batch: &BatchReport) -> Result<()> {
    println!(
        "{:<24} {:>7} {:>6} {:>6} {:>6} {:>9} {:>6} {:>6} {:>6} {:>6}",
        style("Repo").bold(),
        style("Commits").bold(),
        style("Before").bold(),
        style("During").bold(),
        style("After").bold(),
        style("LOC+").bold(),
        style("Early").bold(),
        style("Bulk").bold(),
        style("Drop").bold(),
        style("Merge").bold()
    );
    println!("{}", "─".repeat(96));
    for r in rows {
        println!(
            "{:<24} {:>7} {:>6} {:>6} {:>6} {:>9} {:>6} {:>6} {:>6} {:>6}",
            r.repo_id,
            r.total_commits,
            r.total_commits_before_t0,
            r.total_commits_during_event,
            r.total_commits_after_t1,
            r.total_loc_added,
            mark(r.has_commits_before_t0),
            mark(r.has_bulk_commits),
            mark(r.has_large_initial_commit_after_t0),
            mark(r.has_merge_commits)
        );
    }

    println!(
        "\n{} analyzed, {} from cache, {} failed",
        style(batch.fresh).green(),
        style(batch.cached).cyan(),
        style(batch.failures.len()).red()
    );
    for f in &batch.failures {
        println!("  {} {} ({})", style("✗").red(), f.repo_id, style(&f.message).dim());
    }
    Ok(())
}
