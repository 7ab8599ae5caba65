use super::{output_json, output_ndjson, output_table};
use crate::audit::audit;
use crate::git::{read_history, GitCli, GitRepo};
use crate::model::EventWindow;
use anyhow::Context;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct AnalyzeArgs {
    pub repo: Option<PathBuf>,
    pub t0: String,
    pub t1: Option<String>,
    pub branch: Option<String>,
    pub json: bool,
    pub ndjson: bool,
}

pub fn exec(args: AnalyzeArgs) -> anyhow::Result<()> {
    let window = EventWindow::parse(&args.t0, args.t1.as_deref())
        .context("Failed to parse event window")?;
    let repo = GitRepo::open(args.repo.as_ref()).context("Failed to open git repository")?;

    let branch = match args.branch {
        Some(branch) => branch,
        None => repo.default_branch().unwrap_or_else(|e| {
            warn!("Cannot resolve default branch ({e}); reading HEAD.");
            "HEAD".to_string()
        }),
    };
    debug!(branch = %branch, path = %repo.path().display(), "Reading history");

    let commits = read_history(&GitCli::default(), repo.path(), &branch)
        .with_context(|| format!("Failed to read history of {branch}"))?;
    let audit = audit(&commits, &window);

    if args.json {
        output_json(&audit, &repo, &branch, &window)?;
    } else if args.ndjson {
        output_ndjson(&audit.timeline.commits)?;
    } else {
        output_table(&audit, &branch, &window)?;
    }

    Ok(())
}
