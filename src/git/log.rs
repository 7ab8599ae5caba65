//! Parsing of `git log --numstat` output into [`Commit`] records.
//!
//! The stream is requested oldest-first. Each commit starts with a header of
//! six fields joined by `0x1F` (hash, ISO author date, author name, author
//! email, parent hashes, subject), followed by zero or more
//! `insertions\tdeletions\tpath` lines and a blank separator.

use super::GitCli;
use crate::error::{Result, ScanError};
use crate::model::Commit;
use crate::util::parse_iso_datetime;
use std::path::Path;

pub const FIELD_SEPARATOR: char = '\x1f';
pub const LOG_PRETTY_FORMAT: &str = "--pretty=format:%H%x1f%aI%x1f%an%x1f%ae%x1f%P%x1f%s";

enum LogLine<'a> {
    Header(&'a str),
    FileStat(&'a str),
    Blank,
}

impl<'a> LogLine<'a> {
    fn classify(line: &'a str) -> Self {
        if line.trim().is_empty() {
            LogLine::Blank
        } else if line.contains(FIELD_SEPARATOR) {
            LogLine::Header(line)
        } else {
            LogLine::FileStat(line)
        }
    }
}

#[derive(Debug, Default)]
enum ParseState {
    #[default]
    NoOpenCommit,
    AccumulatingFileStats(Commit),
}

#[derive(Debug, Default)]
pub struct LogParser {
    state: ParseState,
    commits: Vec<Commit>,
    line_no: usize,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;
        let state = std::mem::take(&mut self.state);
        self.state = match (state, LogLine::classify(line)) {
            (ParseState::NoOpenCommit, LogLine::Blank) => ParseState::NoOpenCommit,
            (ParseState::AccumulatingFileStats(commit), LogLine::Blank) => {
                self.commits.push(commit);
                ParseState::NoOpenCommit
            }
            (previous, LogLine::Header(header)) => {
                if let ParseState::AccumulatingFileStats(commit) = previous {
                    self.commits.push(commit);
                }
                ParseState::AccumulatingFileStats(self.parse_header(header)?)
            }
            (ParseState::AccumulatingFileStats(mut commit), LogLine::FileStat(stat)) => {
                apply_numstat(&mut commit, stat);
                ParseState::AccumulatingFileStats(commit)
            }
            (ParseState::NoOpenCommit, LogLine::FileStat(stray)) => {
                return Err(self.malformed(stray));
            }
        };
        Ok(())
    }

    pub fn finish(mut self) -> Vec<Commit> {
        if let ParseState::AccumulatingFileStats(commit) = self.state {
            self.commits.push(commit);
        }
        self.commits
    }

    fn parse_header(&self, line: &str) -> Result<Commit> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let &[sha, author_iso, author_name, author_email, parents, subject] = fields.as_slice() else {
            return Err(self.malformed(line));
        };

        let author_time = parse_iso_datetime(author_iso).map_err(|_| self.malformed(line))?;
        let parent_shas = parents.split_whitespace().map(str::to_owned).collect();

        let mut commit = Commit::new(sha, author_time, parent_shas, subject);
        commit.author_name = author_name.to_string();
        commit.author_email = author_email.to_string();
        Ok(commit)
    }

    fn malformed(&self, line: &str) -> ScanError {
        ScanError::MalformedHistory {
            line_no: self.line_no,
            line: line.to_string(),
        }
    }
}

// Lines that are not the three-field tab layout (e.g. a stray diagnostic)
// are ignored rather than counted.
fn apply_numstat(commit: &mut Commit, line: &str) {
    let fields: Vec<&str> = line.split('\t').collect();
    if let &[added, deleted, _path] = fields.as_slice() {
        commit.add_file_change(parse_count(added), parse_count(deleted));
    }
}

/// Git prints `-` instead of counts for binary files.
fn parse_count(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub fn parse_log(text: &str) -> Result<Vec<Commit>> {
    let mut parser = LogParser::new();
    for line in text.lines() {
        parser.feed_line(line)?;
    }
    Ok(parser.finish())
}

/// Checks out `branch` and returns every commit reachable from it, oldest
/// first.
pub fn collect_commits(git: &GitCli, repo_dir: &Path, branch: &str) -> Result<Vec<Commit>> {
    git.run(Some(repo_dir), &["checkout", "--quiet", branch])?;
    read_history(git, repo_dir, branch)
}

pub fn read_history(git: &GitCli, repo_dir: &Path, rev: &str) -> Result<Vec<Commit>> {
    let stdout = git.run(
        Some(repo_dir),
        &["log", "--reverse", LOG_PRETTY_FORMAT, "--numstat", rev, "--"],
    )?;
    parse_log(&stdout)
}
