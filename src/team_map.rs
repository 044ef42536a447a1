use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::dataset;

pub const TEAM_MAP_FILE: &str = "team_id_map.json";

/// Team name to api-football id, kept sorted so the saved file diffs
/// cleanly between runs.
pub type TeamMap = BTreeMap<String, u32>;

pub fn team_map_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TEAM_MAP_FILE)
}

/// A missing or unreadable map file is just an empty map; the resolver
/// tool rebuilds it.
pub fn load_team_map(path: &Path) -> TeamMap {
    let Ok(raw) = fs::read_to_string(path) else {
        return TeamMap::new();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

pub fn save_team_map(path: &Path, map: &TeamMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(map).context("serialize team map")?;
    fs::write(&tmp, json).context("write team map")?;
    fs::rename(&tmp, path).context("swap team map")?;
    Ok(())
}

/// Every unique team name across the readable results CSVs in `data_dir`.
/// Unreadable files are skipped; only a missing directory is an error.
pub fn collect_team_names(data_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("read data dir {}", data_dir.display()))?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Ok(load) = dataset::read_matches_csv(&path) else {
            continue;
        };
        for m in load.matches {
            names.insert(m.home);
            names.insert(m.away);
        }
    }
    Ok(names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ballknowledge-team-map-{tag}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = temp_dir("roundtrip");
        let path = team_map_path(&dir);

        let mut map = TeamMap::new();
        map.insert("Arsenal".to_string(), 42);
        map.insert("Liverpool".to_string(), 40);
        save_team_map(&path, &map).unwrap();

        assert_eq!(load_team_map(&path), map);
        // The temp file from the atomic swap must not linger.
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_or_corrupt_file_loads_empty() {
        let dir = temp_dir("corrupt");
        let path = team_map_path(&dir);
        assert!(load_team_map(&path).is_empty());

        fs::write(&path, "{not json").unwrap();
        assert!(load_team_map(&path).is_empty());
    }

    #[test]
    fn collects_names_from_both_schemas() {
        let dir = temp_dir("collect");
        fs::write(
            dir.join("club.csv"),
            "Date,HomeTeam,AwayTeam,FTHG,FTAG\n2023-08-11,Burnley,Manchester City,0,3\n",
        )
        .unwrap();
        fs::write(
            dir.join("international.csv"),
            "Date,Home Team,Away Team,Home Goals,Away Goals\n2021-06-11,Italy,Turkey,3,0\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "not a csv").unwrap();

        let names = collect_team_names(&dir).unwrap();
        assert_eq!(names, vec!["Burnley", "Italy", "Manchester City", "Turkey"]);
    }
}
