use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::Datelike;

use crate::dataset::{self, MatchResult};
use crate::elo::{EloConfig, EloTable};
use crate::features::{self, TeamForm};
use crate::power::{self, PowerRow};
use crate::predictor::MatchPredictor;

/// One league code mapped to its results file. `cutoff_year` bounds replay
/// for aggregated datasets that reach back a century; club-season files load
/// in full.
#[derive(Debug, Clone)]
pub struct LeagueSpec {
    pub code: &'static str,
    pub file: &'static str,
    pub cutoff_year: Option<i32>,
}

pub fn default_league_specs() -> Vec<LeagueSpec> {
    vec![
        LeagueSpec {
            code: "PL",
            file: "premier_league_2023_24.csv",
            cutoff_year: None,
        },
        LeagueSpec {
            code: "WC",
            file: "international_matches.csv",
            cutoff_year: Some(2020),
        },
    ]
}

/// Everything published for one league: frozen snapshots plus a predictor
/// ready to query. Replaced wholesale on reload, never mutated in place.
#[derive(Debug, Clone)]
pub struct LeagueBundle {
    pub code: String,
    pub ratings: HashMap<String, f64>,
    pub form: HashMap<String, TeamForm>,
    pub table: Vec<PowerRow>,
    pub predictor: MatchPredictor,
}

impl LeagueBundle {
    pub fn has_team(&self, team: &str) -> bool {
        self.predictor.knows(team)
    }

    pub fn team_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.iter().map(|r| r.team.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn row(&self, team: &str) -> Option<&PowerRow> {
        self.table.iter().find(|r| r.team == team)
    }
}

#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub code: String,
    pub teams: usize,
    pub matches_used: usize,
    pub rows_dropped: usize,
}

/// Builds a publishable bundle from raw match rows: sort, truncate, replay
/// ratings, roll form, score, wire the predictor. Zero surviving rows is an
/// error, so callers never publish an empty league.
pub fn build_league(
    code: &str,
    mut matches: Vec<MatchResult>,
    cutoff_year: Option<i32>,
    rows_dropped: usize,
) -> Result<(LeagueBundle, LoadSummary)> {
    // Stable sort: same-day rows keep input order, so replay stays
    // deterministic for date ties.
    matches.sort_by_key(|m| m.date);
    if let Some(year) = cutoff_year {
        matches.retain(|m| m.date.year() >= year);
    }
    if matches.is_empty() {
        return Err(anyhow!("league {code}: no valid rows after filtering"));
    }

    let mut ratings = EloTable::new(EloConfig::default());
    ratings.replay(&matches);

    let form = features::compute_rolling_form(&matches);
    let table = power::build_power_table(&ratings, &form);
    let predictor = MatchPredictor::new(ratings.clone(), power::power_lookup(&table));

    let summary = LoadSummary {
        code: code.to_string(),
        teams: table.len(),
        matches_used: matches.len(),
        rows_dropped,
    };
    let bundle = LeagueBundle {
        code: code.to_string(),
        ratings: ratings.into_snapshot(),
        form,
        table,
        predictor,
    };
    Ok((bundle, summary))
}

pub fn build_league_csv(
    code: &str,
    path: &Path,
    cutoff_year: Option<i32>,
) -> Result<(LeagueBundle, LoadSummary)> {
    let load = dataset::read_matches_csv(path)?;
    build_league(code, load.matches, cutoff_year, load.rows_dropped)
}

/// Owns the published bundle per league code. A load replaces the entry
/// atomically on success; any failure leaves the previous bundle readable.
#[derive(Debug, Default)]
pub struct LeagueRegistry {
    leagues: HashMap<String, LeagueBundle>,
}

impl LeagueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&LeagueBundle> {
        self.leagues.get(code)
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.leagues.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn publish(&mut self, bundle: LeagueBundle) {
        self.leagues.insert(bundle.code.clone(), bundle);
    }

    pub fn load_matches(
        &mut self,
        code: &str,
        matches: Vec<MatchResult>,
        cutoff_year: Option<i32>,
    ) -> Result<LoadSummary> {
        let (bundle, summary) = build_league(code, matches, cutoff_year, 0)?;
        self.publish(bundle);
        Ok(summary)
    }

    pub fn load_csv(
        &mut self,
        code: &str,
        path: &Path,
        cutoff_year: Option<i32>,
    ) -> Result<LoadSummary> {
        let (bundle, summary) = build_league_csv(code, path, cutoff_year)?;
        self.publish(bundle);
        Ok(summary)
    }
}
