use crate::roster::{load_repo_name_map, parse_repo_slug, read_rows, RosterRow};
use anyhow::Context;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use tracing::warn;

pub struct ListArgs {
    pub repos: PathBuf,
    pub repo_map: Option<PathBuf>,
    pub names_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub team: String,
    pub clone_url: String,
}

// Rows without a repo are dropped; unparsable ones come back as (row, value).
pub fn submissions(
    rows: &[RosterRow],
    names: &HashMap<String, String>,
) -> (Vec<Submission>, Vec<(usize, String)>) {
    let mut listed = Vec::new();
    let mut unparsable = Vec::new();
    for row in rows {
        let raw = row.repo.trim();
        if raw.is_empty() {
            continue;
        }
        let Some(parsed) = parse_repo_slug(raw) else {
            unparsable.push((row.row, raw.to_string()));
            continue;
        };
        let team = names
            .get(&parsed.slug)
            .cloned()
            .or_else(|| row.team_label().map(str::to_owned))
            .unwrap_or_else(|| parsed.slug.replace('/', "-"));
        listed.push(Submission {
            team,
            clone_url: parsed.clone_url,
        });
    }
    (listed, unparsable)
}

pub fn exec(args: ListArgs) -> anyhow::Result<()> {
    let file = File::open(&args.repos)
        .with_context(|| format!("Repos CSV not found: {}", args.repos.display()))?;
    let rows = read_rows(file).context("Failed to read roster")?;
    let names = match &args.repo_map {
        Some(path) => load_repo_name_map(path)
            .with_context(|| format!("Failed to read repo map {}", path.display()))?,
        None => HashMap::new(),
    };

    let (listed, unparsable) = submissions(&rows, &names);
    for (row, raw) in unparsable {
        warn!("Skipping row {row}: could not extract owner/repo from {raw}");
    }

    for (idx, s) in listed.iter().enumerate() {
        if args.names_only {
            println!("{:02}. {}", idx + 1, s.team);
        } else {
            println!("{:02}. {} -> {}", idx + 1, s.team, s.clone_url);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_come_from_map_then_row_then_slug() {
        let csv = "id,repo_url,team\n,https://github.com/acme/rocket,\nr2,git@github.com:acme/boat.git,Boaters\n,acme/car,\n,,\n,nonsense,\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        let names = HashMap::from([("acme/rocket".to_string(), "Rocket Team".to_string())]);

        let (listed, unparsable) = submissions(&rows, &names);
        assert_eq!(
            listed,
            vec![
                Submission {
                    team: "Rocket Team".into(),
                    clone_url: "https://github.com/acme/rocket".into(),
                },
                Submission {
                    team: "Boaters".into(),
                    clone_url: "git@github.com:acme/boat.git".into(),
                },
                Submission {
                    team: "acme-car".into(),
                    clone_url: "https://github.com/acme/car.git".into(),
                },
            ]
        );
        assert_eq!(unparsable, vec![(6, "nonsense".to_string())]);
    }
}
