pub mod batch;
pub mod exec;
pub mod output;
pub mod pipeline;

pub use batch::{run_batch, BatchOptions, BatchReport, RepoFailure};
pub use exec::{exec, ScanArgs};
pub use pipeline::{prepare_job, run_repo, RepoJob};

use crate::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WorkDirs {
    pub root: PathBuf,
    pub repos: PathBuf,
    pub metrics: PathBuf,
    pub summary: PathBuf,
    pub logs: PathBuf,
}

impl WorkDirs {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            repos: root.join("repos"),
            metrics: root.join("metrics"),
            summary: root.join("summary"),
            logs: root.join("logs"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.repos, &self.metrics, &self.summary, &self.logs] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
