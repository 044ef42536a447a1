use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::predictor::{DEFAULT_REST_DAYS, Injury, Position};

const BASE_URL: &str = "https://v3.football.api-sports.io";
const API_HOST: &str = "v3.football.api-sports.io";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_SEASON: u16 = 2024;

/// Injury lists longer than this are noise for the impact model.
const MAX_INJURIES: usize = 8;

/// A gap longer than this is a season break, not fatigue signal.
const MAX_REST_GAP_DAYS: i64 = 30;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Blocking client for the api-football v3 endpoints the predictor feeds
/// from: injuries, last-fixture dates, team search, lineups.
#[derive(Debug, Clone)]
pub struct SportsApi {
    key: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub gk: u32,
    pub def: u32,
    pub mid: u32,
    pub att: u32,
}

/// One starter from the most recent lineup.
#[derive(Debug, Clone, PartialEq)]
pub struct LineupSlot {
    pub id: String,
    pub name: String,
    pub number: Option<i64>,
    pub pos: Option<String>,
}

impl SportsApi {
    /// Reads `API_FOOTBALL_KEY` from the environment (`.env` honored).
    /// Absent key means no client; callers degrade to defaults.
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        let key = std::env::var("API_FOOTBALL_KEY").ok()?;
        let key = key.trim().to_string();
        if key.is_empty() { None } else { Some(Self { key }) }
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let client = http_client()?;
        let url = format!("{BASE_URL}/{path}");
        let resp = client
            .get(&url)
            .header("x-apisports-key", &self.key)
            .header("x-rapidapi-host", API_HOST)
            .query(params)
            .send()
            .with_context(|| format!("request {path} failed"))?;

        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status}: {body}"));
        }
        serde_json::from_str::<Value>(body.trim()).with_context(|| format!("invalid {path} json"))
    }

    pub fn injuries(&self, team_id: u32, season: u16) -> Result<Vec<Injury>> {
        let value = self.get(
            "injuries",
            &[
                ("team", team_id.to_string()),
                ("season", season.to_string()),
            ],
        )?;
        Ok(parse_injuries(&value))
    }

    /// Kick-off time of the team's most recent finished fixture.
    pub fn last_match_date(&self, team_id: u32, season: u16) -> Result<Option<DateTime<Utc>>> {
        let value = self.get(
            "fixtures",
            &[
                ("team", team_id.to_string()),
                ("last", "1".to_string()),
                ("status", "FT".to_string()),
                ("season", season.to_string()),
            ],
        )?;
        Ok(parse_last_match_date(&value))
    }

    pub fn search_team_id(&self, team_name: &str) -> Result<Option<u32>> {
        let value = self.get("teams", &[("search", team_name.to_string())])?;
        Ok(parse_team_search(&value))
    }

    /// Starting XI of the most recent fixture, as a proxy for the current
    /// lineup.
    pub fn lineup(&self, team_id: u32, season: u16) -> Result<Vec<LineupSlot>> {
        let value = self.get(
            "fixtures",
            &[
                ("team", team_id.to_string()),
                ("last", "1".to_string()),
                ("season", season.to_string()),
            ],
        )?;
        let Some(fixture_id) = parse_first_fixture_id(&value) else {
            return Ok(Vec::new());
        };

        let value = self.get(
            "fixtures/lineups",
            &[
                ("fixture", fixture_id.to_string()),
                ("team", team_id.to_string()),
            ],
        )?;
        Ok(parse_lineup(&value))
    }
}

pub fn parse_injuries(value: &Value) -> Vec<Injury> {
    let Some(rows) = value.get("response").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut injuries: Vec<Injury> = Vec::new();
    for row in rows {
        let Some(player) = row.get("player") else {
            continue;
        };
        let Some(name) = player.get("name").and_then(Value::as_str) else {
            continue;
        };
        // The feed repeats a player once per missed fixture.
        if injuries.iter().any(|i| i.name == name) {
            continue;
        }
        let position = player
            .get("type")
            .and_then(Value::as_str)
            .map(position_from_label)
            .unwrap_or_default();
        injuries.push(Injury {
            name: name.to_string(),
            position,
            // Severity is tuned by hand downstream; the feed has none.
            impact: 5,
        });
        if injuries.len() == MAX_INJURIES {
            break;
        }
    }
    injuries
}

fn position_from_label(label: &str) -> Position {
    match label {
        "Goalkeeper" => Position::Gk,
        "Defender" => Position::Def,
        "Midfielder" => Position::Mid,
        "Attacker" => Position::Att,
        _ => Position::Mid,
    }
}

pub fn parse_last_match_date(value: &Value) -> Option<DateTime<Utc>> {
    let date = value
        .get("response")?
        .as_array()?
        .first()?
        .get("fixture")?
        .get("date")?
        .as_str()?;
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

pub fn parse_team_search(value: &Value) -> Option<u32> {
    let id = value
        .get("response")?
        .as_array()?
        .first()?
        .get("team")?
        .get("id")?
        .as_u64()?;
    u32::try_from(id).ok()
}

pub fn parse_first_fixture_id(value: &Value) -> Option<u64> {
    value
        .get("response")?
        .as_array()?
        .first()?
        .get("fixture")?
        .get("id")?
        .as_u64()
}

pub fn parse_lineup(value: &Value) -> Vec<LineupSlot> {
    let Some(start) = value
        .get("response")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("startXI"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    start
        .iter()
        .filter_map(|slot| {
            let player = slot.get("player")?;
            let id = player.get("id").and_then(Value::as_i64)?;
            Some(LineupSlot {
                id: id.to_string(),
                name: player.get("name")?.as_str()?.to_string(),
                number: player.get("number").and_then(Value::as_i64),
                pos: player
                    .get("pos")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Days of rest derived from the last finished fixture. No fixture, a
/// negative gap, or a gap past a season break all read as a normal week.
pub fn rest_days(last_match: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(last) = last_match else {
        return DEFAULT_REST_DAYS;
    };
    let delta = (now - last).num_days();
    if delta > MAX_REST_GAP_DAYS || delta < 0 {
        DEFAULT_REST_DAYS
    } else {
        delta.max(1)
    }
}

pub fn role_counts(injuries: &[Injury]) -> RoleCounts {
    let mut counts = RoleCounts::default();
    for injury in injuries {
        match injury.position {
            Position::Gk => counts.gk += 1,
            Position::Def => counts.def += 1,
            Position::Mid => counts.mid += 1,
            Position::Att => counts.att += 1,
        }
    }
    counts
}
