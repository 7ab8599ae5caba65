use crate::error::{Result, ScanError};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const REPO_MAP_REPO_KEYS: [&str; 5] = [
    "Please provide the Github URL of your project (should be publicly accessible)",
    "repo_url",
    "repo",
    "github_url",
    "github",
];

const REPO_MAP_NAME_KEYS: [&str; 5] = [
    "What is your team or product name? (will be used when announcing winners)",
    "team_name",
    "team",
    "name",
    "product_name",
];

/// A roster row as written, before validation. Row numbers are 1-based file
/// lines, so the first data row is 2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RosterRow {
    #[serde(skip)]
    pub row: usize,
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "repo_url")]
    pub repo: String,
    #[serde(default)]
    pub t0: String,
    #[serde(default, alias = "Team Name")]
    pub team_name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub repo_id: String,
    pub repo: String,
    pub clone_url: String,
    pub t0: Option<String>,
}

impl RosterRow {
    pub fn into_entry(self) -> Result<RosterEntry> {
        let repo_id = self.id.trim().to_string();
        let repo = self.repo.trim().to_string();
        if repo_id.is_empty() || repo.is_empty() {
            return Err(ScanError::RosterEntryIncomplete {
                row: self.row,
                reason: "both `id` and `repo` are required".to_string(),
            });
        }
        if !is_filename_safe(&repo_id) {
            return Err(ScanError::RosterEntryIncomplete {
                row: self.row,
                reason: format!("id '{repo_id}' cannot be used as a file name"),
            });
        }
        let t0 = Some(self.t0.trim()).filter(|s| !s.is_empty()).map(str::to_owned);
        Ok(RosterEntry {
            clone_url: resolve_clone_url(&repo),
            repo_id,
            repo,
            t0,
        })
    }

    pub fn team_label(&self) -> Option<&str> {
        [&self.team_name, &self.team, &self.name, &self.id]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub skipped: Vec<ScanError>,
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RosterRow>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    for (idx, record) in rdr.deserialize::<RosterRow>().enumerate() {
        let mut row = record?;
        row.row = idx + 2;
        rows.push(row);
    }
    Ok(rows)
}

/// Loads and validates the roster. Incomplete rows and repeated ids are
/// returned in `skipped` rather than failing the whole file; the first row
/// for an id wins.
pub fn load_roster(path: &Path) -> Result<Roster> {
    validate_rows(read_rows(File::open(path)?)?)
}

pub fn validate_rows(rows: Vec<RosterRow>) -> Result<Roster> {
    let mut roster = Roster {
        entries: Vec::with_capacity(rows.len()),
        skipped: Vec::new(),
    };
    let mut seen = HashSet::new();
    for row in rows {
        let row_no = row.row;
        match row.into_entry() {
            Ok(entry) if !seen.insert(entry.repo_id.clone()) => {
                roster.skipped.push(ScanError::RosterEntryIncomplete {
                    row: row_no,
                    reason: format!("duplicate id '{}'", entry.repo_id),
                });
            }
            Ok(entry) => roster.entries.push(entry),
            Err(e) => roster.skipped.push(e),
        }
    }
    Ok(roster)
}

fn is_filename_safe(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

/// Full URLs, SSH remotes and existing local paths are used verbatim;
/// anything else is taken as a GitHub `owner/repo` shorthand.
pub fn resolve_clone_url(location: &str) -> String {
    let location = location.trim();
    if location.contains("://") || location.starts_with("git@") || Path::new(location).is_dir() {
        return location.to_string();
    }
    let slug = location.trim_matches('/');
    let slug = slug.strip_suffix(".git").unwrap_or(slug);
    format!("https://github.com/{slug}.git")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub slug: String,
    pub clone_url: String,
}

pub fn parse_repo_slug(raw: &str) -> Option<RepoSlug> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path_part = if let Some(rest) = trimmed.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else if let Some((_, after_scheme)) = trimmed.split_once("://") {
        after_scheme.split_once('/')?.1
    } else {
        trimmed
    };

    let path_part = path_part.trim_matches('/');
    let path_part = path_part.strip_suffix(".git").unwrap_or(path_part);
    let mut parts = path_part.split('/');
    let (owner, repo) = (parts.next()?, parts.next()?);
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    let slug = format!("{owner}/{repo}");
    let clone_url = if trimmed.contains("://") || trimmed.starts_with("git@") {
        trimmed.to_string()
    } else {
        format!("https://github.com/{slug}.git")
    };
    Some(RepoSlug { slug, clone_url })
}

/// Reads an optional slug → team-name map. The file may be comma- or
/// tab-delimited; the first name seen for a slug wins.
pub fn load_repo_name_map(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let text = std::fs::read_to_string(path)?;
    read_repo_name_map(&text)
}

pub fn read_repo_name_map(text: &str) -> Result<HashMap<String, String>> {
    let sample: String = text.chars().take(2048).collect();
    let delimiter = if sample.contains('\t') { b'\t' } else { b',' };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();

    let mut map = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        let row: HashMap<&str, &str> = headers.iter().zip(record.iter()).collect();
        let first_non_empty = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| row.get(k))
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_owned)
        };

        let name = first_non_empty(&REPO_MAP_NAME_KEYS[..]);
        let repo_val = first_non_empty(&REPO_MAP_REPO_KEYS[..]).or_else(|| {
            record
                .iter()
                .find(|v| v.contains("github.com"))
                .map(|v| v.trim().to_string())
        });
        let Some(repo_val) = repo_val else {
            continue;
        };

        let candidates = repo_val.replace('\n', " ");
        for candidate in candidates.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            if let Some(parsed) = parse_repo_slug(candidate) {
                let label = name.clone().unwrap_or_else(|| parsed.slug.replace('/', "-"));
                map.entry(parsed.slug).or_insert(label);
            }
        }
    }
    Ok(map)
}
