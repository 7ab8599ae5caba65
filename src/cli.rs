use crate::analyze::AnalyzeArgs;
use crate::list::ListArgs;
use crate::scan::ScanArgs;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("jobs must be at least 1".to_string())
    } else if n > 64 {
        Err("jobs cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

#[derive(Parser)]
#[command(name = "hackscan")]
#[command(about = "Audit hackathon repositories for work done outside the event window")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, default_value = "work", env = "HACKSCAN_WORK_DIR", help = "Working directory for clones, reports, cache and logs")]
    pub work_dir: PathBuf,

    #[arg(long, global = true, default_value = "info", env = "HACKSCAN_LOG", value_parser = ["error", "warn", "info", "debug", "trace"], help = "Log level (RUST_LOG overrides)")]
    pub log_level: String,
}

#[derive(Args, Clone)]
pub struct WindowArgs {
    #[arg(long, help = "Event start (ISO-8601; a missing offset means UTC)")]
    pub t0: String,

    #[arg(long, help = "Event end (ISO-8601); open-ended when omitted")]
    pub t1: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone or update every roster repository and write per-repo reports plus a summary
    Scan {
        #[arg(long, help = "Roster CSV with id, repo and optional t0 columns")]
        repos: PathBuf,

        #[clap(flatten)]
        window: WindowArgs,

        #[arg(long, help = "Recompute repositories that already have cached metrics")]
        force: bool,

        #[arg(long, help = "Reuse existing clones without fetching")]
        no_update: bool,

        #[arg(long, default_value = "1", env = "HACKSCAN_JOBS", value_parser = parse_jobs, help = "Repositories processed in parallel (1-64)")]
        jobs: usize,

        #[arg(long, default_value = "10m", env = "HACKSCAN_TIMEOUT", value_parser = humantime::parse_duration, help = "Limit for each git command; 0 disables it")]
        timeout: Duration,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Audit one local repository and print the result
    Analyze {
        #[arg(long, help = "Path to git repository")]
        repo: Option<PathBuf>,

        #[clap(flatten)]
        window: WindowArgs,

        #[arg(long, help = "Branch or revision to read (default: origin HEAD, then current branch)")]
        branch: Option<String>,

        #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
        json: bool,

        #[arg(long, help = "Output classified commits as NDJSON")]
        ndjson: bool,
    },
    /// Print roster entries in submission order
    List {
        #[arg(long, help = "Roster CSV")]
        repos: PathBuf,

        #[arg(long, help = "Optional CSV or TSV mapping repo URLs to team names")]
        repo_map: Option<PathBuf>,

        #[arg(long, help = "Only print team names")]
        names_only: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        match self.command {
            Commands::Scan { .. } => Some(self.common.work_dir.join("logs")),
            _ => None,
        }
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Scan { repos, window, force, no_update, jobs, timeout, json } => {
                let args = ScanArgs {
                    repos,
                    t0: window.t0,
                    t1: window.t1,
                    force,
                    no_update,
                    jobs,
                    timeout,
                    json,
                };
                crate::scan::exec(self.common, args)
            }
            Commands::Analyze { repo, window, branch, json, ndjson } => {
                let args = AnalyzeArgs {
                    repo,
                    t0: window.t0,
                    t1: window.t1,
                    branch,
                    json,
                    ndjson,
                };
                crate::analyze::exec(args)
            }
            Commands::List { repos, repo_map, names_only } => {
                crate::list::exec(ListArgs { repos, repo_map, names_only })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_are_bounded() {
        assert_eq!(parse_jobs("4"), Ok(4));
        assert!(parse_jobs("0").is_err());
        assert!(parse_jobs("65").is_err());
        assert!(parse_jobs("many").is_err());
    }

    #[test]
    fn scan_defaults() {
        let cli = <Cli as Parser>::try_parse_from(["hackscan", "scan", "--repos", "r.csv", "--t0", "2024-03-01T09:00:00Z"]).unwrap();
        assert_eq!(cli.log_dir(), Some(PathBuf::from("work").join("logs")));
        match cli.command {
            Commands::Scan { jobs, timeout, force, window, .. } => {
                assert_eq!(jobs, 1);
                assert_eq!(timeout, Duration::from_secs(600));
                assert!(!force);
                assert_eq!(window.t1, None);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn analyze_rejects_both_output_modes() {
        let parsed = <Cli as Parser>::try_parse_from([
            "hackscan", "analyze", "--t0", "2024-03-01", "--json", "--ndjson",
        ]);
        assert!(parsed.is_err());
    }
}
