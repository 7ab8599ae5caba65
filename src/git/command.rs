use crate::error::{Result, ScanError};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Option<Duration>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new(Some(DEFAULT_TIMEOUT))
    }
}

impl GitCli {
    /// `None` (or a zero duration) waits forever.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout: timeout.filter(|d| !d.is_zero()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<String> {
        let label = format!("git {}", args.first().copied().unwrap_or_default());
        let mut command = Command::new("git");
        if let Some(d) = dir {
            command.arg("-C").arg(d);
        }
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");

        debug!(command = %label, ?args, "spawning");
        self.execute(command, &label)
    }

    fn execute(&self, mut command: Command, label: &str) -> Result<String> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::SourceUnavailable(format!("{label}: executable not found on PATH"))
            } else {
                ScanError::SourceUnavailable(format!("failed to spawn {label}: {e}"))
            }
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child, label)?;
        let stdout = join(stdout);
        let stderr = join(stderr);

        if !status.success() {
            return Err(ScanError::SourceUnavailable(format!(
                "{label} exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn wait(&self, child: &mut Child, label: &str) -> Result<ExitStatus> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                warn!(command = %label, "killed after {}", humantime::format_duration(limit));
                return Err(ScanError::Timeout {
                    command: label.to_string(),
                    after: limit,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

// Pipes are read on their own threads so a chatty child never blocks on a
// full pipe while we poll for exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
