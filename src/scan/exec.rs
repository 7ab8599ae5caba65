use super::batch::{run_batch, BatchOptions};
use super::output::{output_json, output_table};
use super::WorkDirs;
use crate::cache::Cache;
use crate::cli::CommonArgs;
use crate::git::GitCli;
use crate::model::EventWindow;
use crate::report::{write_summary_file, SummaryRow};
use crate::roster::load_roster;
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub struct ScanArgs {
    pub repos: PathBuf,
    pub t0: String,
    pub t1: Option<String>,
    pub force: bool,
    pub no_update: bool,
    pub jobs: usize,
    pub timeout: Duration,
    pub json: bool,
}

/// Runs the whole roster. Per-repository failures are logged and skipped;
/// only run-level problems (bad global window, unreadable roster, unusable
/// work dir) return an error.
pub fn exec(common: CommonArgs, args: ScanArgs) -> anyhow::Result<()> {
    let dirs = WorkDirs::new(&common.work_dir);
    dirs.ensure().context("Failed to create work directory")?;

    let window = EventWindow::parse(&args.t0, args.t1.as_deref())
        .context("Failed to parse global event window")?;

    let roster = load_roster(&args.repos)
        .with_context(|| format!("Failed to read roster {}", args.repos.display()))?;
    for skipped in &roster.skipped {
        warn!(kind = skipped.kind(), "Skipping roster row: {skipped}");
    }
    if roster.entries.is_empty() {
        warn!("No repos found in roster.");
        return Ok(());
    }

    let mut cache = Cache::new(&dirs.root).context("Failed to initialize cache")?;
    let git = GitCli::new(Some(args.timeout));
    let opts = BatchOptions {
        force: args.force,
        update: !args.no_update,
        jobs: args.jobs,
        show_progress: !args.json && console::Term::stderr().is_term(),
    };

    let batch = run_batch(roster.entries, &window, &dirs, &mut cache, &git, &opts)
        .context("Failed to scan repositories")?;

    let rows: Vec<SummaryRow> = batch.reports.iter().map(SummaryRow::from).collect();
    if rows.is_empty() {
        warn!("No summary rows generated.");
    } else {
        let path = write_summary_file(&dirs.summary, &rows).context("Failed to write summary CSV")?;
        info!("Wrote summary CSV to {}", path.display());
    }

    if args.json {
        output_json(&batch)?;
    } else {
        output_table(&rows, &batch)?;
    }

    Ok(())
}
