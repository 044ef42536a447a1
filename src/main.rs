use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use chrono::Utc;
use rayon::prelude::*;

use ballknowledge::league::{LeagueBundle, LeagueRegistry, default_league_specs};
use ballknowledge::predictor::MatchContext;
use ballknowledge::preview::generate_match_preview;
use ballknowledge::sports_api::{self, SportsApi};
use ballknowledge::team_map;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let data_dir = data_dir();
    let mut registry = LeagueRegistry::new();
    load_all_leagues(&mut registry, &data_dir);

    match command.as_str() {
        "teams" => cmd_teams(&registry, &args),
        "table" => cmd_table(&registry, &args),
        "predict" => cmd_predict(&registry, &data_dir, &args),
        "preview" => cmd_preview(&registry, &args),
        other => {
            print_usage();
            Err(anyhow!("unknown command: {other}"))
        }
    }
}

fn print_usage() {
    println!("ballknowledge <command> [args]");
    println!();
    println!("  teams   <LEAGUE>");
    println!("  table   <LEAGUE>");
    println!("  predict <LEAGUE> <HOME> <AWAY> [--home-rest N] [--away-rest N] [--live]");
    println!("  preview <LEAGUE> <HOME> <AWAY>");
    println!();
    println!("Results CSVs are read from ./data (override: BALLKNOWLEDGE_DATA_DIR).");
}

fn data_dir() -> PathBuf {
    std::env::var("BALLKNOWLEDGE_DATA_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Bundles build independently, so they build in parallel; publication
/// stays on this thread. A league that fails to load is reported and
/// skipped, never fatal to the rest.
fn load_all_leagues(registry: &mut LeagueRegistry, data_dir: &Path) {
    let specs = default_league_specs();
    let built: Vec<_> = specs
        .par_iter()
        .map(|spec| {
            let path = data_dir.join(spec.file);
            (
                spec,
                ballknowledge::league::build_league_csv(spec.code, &path, spec.cutoff_year),
            )
        })
        .collect();

    for (spec, result) in built {
        match result {
            Ok((bundle, summary)) => {
                registry.publish(bundle);
                println!(
                    "league {}: {} teams, {} matches ({} rows dropped)",
                    summary.code, summary.teams, summary.matches_used, summary.rows_dropped
                );
            }
            Err(err) => eprintln!("league {} skipped: {err:#}", spec.code),
        }
    }
}

fn lookup_league<'a>(registry: &'a LeagueRegistry, code: &str) -> Result<&'a LeagueBundle> {
    registry.get(code).ok_or_else(|| {
        anyhow!(
            "league {code} is not loaded (available: {})",
            registry.codes().join(", ")
        )
    })
}

fn cmd_teams(registry: &LeagueRegistry, args: &[String]) -> Result<()> {
    let code = positional(args, 1, "LEAGUE")?;
    let bundle = lookup_league(registry, code)?;
    for name in bundle.team_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_table(registry: &LeagueRegistry, args: &[String]) -> Result<()> {
    let code = positional(args, 1, "LEAGUE")?;
    let bundle = lookup_league(registry, code)?;

    println!(
        "{:<26} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "team", "power", "elo", "gf10", "ga10", "pts5"
    );
    for row in &bundle.table {
        println!(
            "{:<26} {:>6.1} {:>6.0} {:>6.2} {:>6.2} {:>6.2}",
            row.team, row.power_score, row.elo, row.gf_last10, row.ga_last10, row.pts_last5
        );
    }
    Ok(())
}

fn cmd_predict(registry: &LeagueRegistry, data_dir: &Path, args: &[String]) -> Result<()> {
    let code = positional(args, 1, "LEAGUE")?;
    let home = positional(args, 2, "HOME")?;
    let away = positional(args, 3, "AWAY")?;

    let bundle = lookup_league(registry, code)?;
    for team in [home, away] {
        if !bundle.has_team(team) {
            return Err(anyhow!("unknown team name: {team}"));
        }
    }

    let mut ctx = MatchContext::default();
    if let Some(rest) = flag_value(args, "--home-rest")? {
        ctx.home_rest_days = rest;
    }
    if let Some(rest) = flag_value(args, "--away-rest")? {
        ctx.away_rest_days = rest;
    }
    if args.iter().any(|a| a == "--live") {
        fill_live_context(&mut ctx, data_dir, home, away)?;
    }

    let pred = bundle.predictor.predict(home, away, &ctx);
    println!("{} vs {}", pred.home, pred.away);
    println!(
        "home win {:.1}%  draw {:.1}%  away win {:.1}%",
        pred.home_win * 100.0,
        pred.draw * 100.0,
        pred.away_win * 100.0
    );
    println!(
        "elo diff {:+.1}  power diff {:+.1}",
        pred.elo_diff, pred.power_diff
    );
    println!(
        "injury penalty: home {:.1}  away {:.1}",
        pred.home_penalty, pred.away_penalty
    );
    println!(
        "fatigue: home {:+.1}  away {:+.1}",
        pred.home_fatigue, pred.away_fatigue
    );
    Ok(())
}

/// Pulls injuries and rest days for both sides through the sports API,
/// using the persisted team-id map.
fn fill_live_context(
    ctx: &mut MatchContext,
    data_dir: &Path,
    home: &str,
    away: &str,
) -> Result<()> {
    let api = SportsApi::from_env()
        .ok_or_else(|| anyhow!("--live needs API_FOOTBALL_KEY in the environment or .env"))?;
    let map = team_map::load_team_map(&team_map::team_map_path(data_dir));
    let now = Utc::now();

    let id_of = |team: &str| -> Result<u32> {
        map.get(team).copied().ok_or_else(|| {
            anyhow!("team {team} is missing from the id map; run the team_map tool first")
        })
    };

    let home_id = id_of(home)?;
    let away_id = id_of(away)?;

    ctx.home_injuries = api.injuries(home_id, sports_api::DEFAULT_SEASON)?;
    ctx.away_injuries = api.injuries(away_id, sports_api::DEFAULT_SEASON)?;
    ctx.home_rest_days = sports_api::rest_days(
        api.last_match_date(home_id, sports_api::DEFAULT_SEASON)?,
        now,
    );
    ctx.away_rest_days = sports_api::rest_days(
        api.last_match_date(away_id, sports_api::DEFAULT_SEASON)?,
        now,
    );

    println!(
        "live context: {} injuries / {} rest days vs {} injuries / {} rest days",
        ctx.home_injuries.len(),
        ctx.home_rest_days,
        ctx.away_injuries.len(),
        ctx.away_rest_days
    );
    Ok(())
}

fn cmd_preview(registry: &LeagueRegistry, args: &[String]) -> Result<()> {
    let code = positional(args, 1, "LEAGUE")?;
    let home = positional(args, 2, "HOME")?;
    let away = positional(args, 3, "AWAY")?;
    let bundle = lookup_league(registry, code)?;
    println!("{}", generate_match_preview(bundle, home, away)?);
    Ok(())
}

fn positional<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("missing argument: {name}"))
}

/// Accepts both `--flag N` and `--flag=N`.
fn flag_value(args: &[String], flag: &str) -> Result<Option<i64>> {
    for (idx, arg) in args.iter().enumerate() {
        let raw = if let Some(rest) = arg.strip_prefix(&format!("{flag}=")) {
            Some(rest.to_string())
        } else if arg == flag {
            args.get(idx + 1).cloned()
        } else {
            None
        };
        if let Some(raw) = raw {
            let value = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow!("{flag} expects a whole number of days, got {raw}"))?;
            return Ok(Some(value));
        }
    }
    Ok(None)
}
