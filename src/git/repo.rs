use crate::error::{Result, ScanError};
use gix::{discover, Repository};
use std::path::{Path, PathBuf};

const ORIGIN_HEAD: &str = "refs/remotes/origin/HEAD";

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The branch history is read from: whatever `origin/HEAD` points at, or
    /// the checked-out branch when the clone has no remote HEAD.
    pub fn default_branch(&self) -> Result<String> {
        let origin_head = self
            .repo
            .try_find_reference(ORIGIN_HEAD)
            .map_err(|e| ScanError::SourceUnavailable(format!("cannot read {ORIGIN_HEAD}: {e}")))?;

        if let Some(reference) = origin_head {
            if let Some(target) = reference.target().try_name() {
                let short = target.shorten().to_string();
                return Ok(match short.strip_prefix("origin/") {
                    Some(branch) => branch.to_string(),
                    None => short,
                });
            }
        }

        match self.repo.head_name()? {
            Some(name) => Ok(name.as_ref().shorten().to_string()),
            None => Err(ScanError::SourceUnavailable(format!(
                "{} has a detached HEAD and no {ORIGIN_HEAD}",
                self.path.display()
            ))),
        }
    }

    pub fn remote_url(&self) -> String {
        self.repo
            .config_snapshot()
            .string("remote.origin.url")
            .map(|url| url.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn falls_back_to_checked_out_branch() {
        let dir = tempfile::tempdir().unwrap();
        if !git(dir.path(), &["init", "--quiet", "--initial-branch=trunk"]) {
            return;
        }
        assert!(git(dir.path(), &["config", "remote.origin.url", "https://example.com/a/b.git"]));

        let repo = GitRepo::open(Some(dir.path())).unwrap();
        assert_eq!(repo.default_branch().unwrap(), "trunk");
        assert_eq!(repo.remote_url(), "https://example.com/a/b.git");
    }

    #[test]
    fn opening_a_plain_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitRepo::open(Some(dir.path())).is_err());
    }
}
