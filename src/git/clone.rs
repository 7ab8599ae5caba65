use super::{GitCli, GitRepo};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Makes sure `<repos_root>/<repo_id>` holds an up-to-date checkout of
/// `clone_url`. Existing clones are fetched and hard-reset to the remote
/// default branch unless `update` is false.
pub fn ensure_cloned(
    git: &GitCli,
    repo_id: &str,
    clone_url: &str,
    repos_root: &Path,
    update: bool,
) -> Result<PathBuf> {
    let repo_dir = repos_root.join(repo_id);

    if !repo_dir.exists() {
        info!(repo_id, clone_url, "cloning");
        let target = repo_dir.to_string_lossy();
        git.run(None, &["clone", "--quiet", clone_url, target.as_ref()])?;
        return Ok(repo_dir);
    }

    if !update {
        debug!(repo_id, "reusing existing clone without fetching");
        return Ok(repo_dir);
    }

    debug!(repo_id, "fetching");
    git.run(Some(&repo_dir), &["fetch", "--all", "--prune", "--quiet"])?;

    let branch = GitRepo::open(Some(&repo_dir))?.default_branch()?;
    let upstream = format!("origin/{branch}");
    git.run(Some(&repo_dir), &["checkout", "--quiet", branch.as_str()])?;
    git.run(Some(&repo_dir), &["reset", "--quiet", "--hard", upstream.as_str()])?;

    Ok(repo_dir)
}
