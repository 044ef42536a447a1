use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};

use ballknowledge::sports_api::SportsApi;
use ballknowledge::team_map::{collect_team_names, load_team_map, save_team_map, team_map_path};

/// Free-tier pacing: roughly one search per second, slower to be safe.
const SEARCH_PACING: Duration = Duration::from_millis(1200);
const AUTOSAVE_EVERY: usize = 10;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let data_dir = parse_data_dir_arg().unwrap_or_else(default_data_dir);
    let api = SportsApi::from_env()
        .ok_or_else(|| anyhow!("API_FOOTBALL_KEY is not set in the environment or .env"))?;

    println!("Scanning CSVs under {} for teams...", data_dir.display());
    let teams = collect_team_names(&data_dir)?;
    println!("Found {} unique teams.", teams.len());

    let map_path = team_map_path(&data_dir);
    let mut map = load_team_map(&map_path);
    println!("Loaded {} existing mappings.", map.len());

    let missing: Vec<&String> = teams.iter().filter(|t| !map.contains_key(*t)).collect();
    println!("Need to resolve {} teams.", missing.len());

    let mut resolved = 0usize;
    let mut failed = 0usize;
    for (idx, team) in missing.iter().enumerate() {
        print!("[{}/{}] Searching for '{team}'... ", idx + 1, missing.len());
        let _ = std::io::stdout().flush();
        match api.search_team_id(team) {
            Ok(Some(id)) => {
                map.insert((*team).clone(), id);
                resolved += 1;
                println!("found: {id}");
            }
            Ok(None) => {
                failed += 1;
                println!("not found");
            }
            Err(err) => {
                failed += 1;
                println!("error: {err:#}");
            }
        }

        thread::sleep(SEARCH_PACING);
        if (idx + 1) % AUTOSAVE_EVERY == 0 {
            save_team_map(&map_path, &map)?;
        }
    }

    save_team_map(&map_path, &map)?;
    println!(
        "Done. {} resolved, {} unresolved, {} total mapped -> {}",
        resolved,
        failed,
        map.len(),
        map_path.display()
    );
    Ok(())
}

fn default_data_dir() -> PathBuf {
    std::env::var("BALLKNOWLEDGE_DATA_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn parse_data_dir_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--data-dir=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--data-dir" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
