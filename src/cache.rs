use crate::error::{Result, ScanError};
use crate::model::{RepoReport, SCHEMA_VERSION};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub const CACHE_FILE: &str = "cache.db";

pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let work_dir = work_dir.as_ref();
        std::fs::create_dir_all(work_dir)?;
        let conn = Connection::open(work_dir.join(CACHE_FILE))?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS reports (
                repo_id TEXT PRIMARY KEY,
                generated_at INTEGER NOT NULL,
                payload TEXT NOT NULL
            );
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(ScanError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    pub fn get_report(&self, repo_id: &str) -> Result<Option<RepoReport>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM reports WHERE repo_id = ?",
                params![repo_id],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    ScanError::Cache(format!("Corrupt cached report for {repo_id}: {e}"))
                })
            })
            .transpose()
    }

    pub fn store_reports(&mut self, reports: &[RepoReport]) -> Result<()> {
        let tx = self.conn.transaction()?;

        let mut upsert = tx.prepare(
            "INSERT OR REPLACE INTO reports (repo_id, generated_at, payload)
             VALUES (?, ?, ?)",
        )?;
        for report in reports {
            upsert.execute(params![
                report.repo_id,
                report.generated_at.timestamp(),
                serde_json::to_string(report)?
            ])?;
        }
        drop(upsert);

        tx.commit()?;
        Ok(())
    }

    pub fn remove_report(&mut self, repo_id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM reports WHERE repo_id = ?", params![repo_id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metrics;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn report(repo_id: &str) -> RepoReport {
        RepoReport {
            version: SCHEMA_VERSION,
            repo_id: repo_id.to_string(),
            repo: format!("acme/{repo_id}"),
            remote_url: String::new(),
            default_branch: "main".to_string(),
            t0: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            t1: None,
            generated_at: Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
            metrics: Metrics::default(),
        }
    }

    #[test]
    fn stored_reports_come_back_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::new(dir.path()).unwrap();
        assert_eq!(cache.get_report("alpha").unwrap(), None);

        let mut alpha = report("alpha");
        alpha.metrics.summary.median_minutes_between_commits = Some(12.5);
        cache.store_reports(&[alpha.clone(), report("beta")]).unwrap();

        let reopened = Cache::new(dir.path()).unwrap();
        assert_eq!(reopened.get_report("alpha").unwrap(), Some(alpha));
        assert!(reopened.get_report("beta").unwrap().is_some());
    }

    #[test]
    fn storing_again_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::new(dir.path()).unwrap();
        cache.store_reports(&[report("alpha")]).unwrap();

        let mut newer = report("alpha");
        newer.default_branch = "trunk".to_string();
        cache.store_reports(&[newer]).unwrap();

        let got = cache.get_report("alpha").unwrap().unwrap();
        assert_eq!(got.default_branch, "trunk");
        assert!(cache.remove_report("alpha").unwrap());
        assert!(!cache.remove_report("alpha").unwrap());
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        {
            let conn = Connection::open(dir.path().join(CACHE_FILE)).unwrap();
            conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        }
        assert!(matches!(Cache::new(dir.path()), Err(ScanError::Cache(_))));
    }
}
