use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::StringRecord;

/// One finished match as parsed from a results CSV. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

#[derive(Debug, Clone)]
pub struct CsvLoad {
    pub matches: Vec<MatchResult>,
    pub rows_dropped: usize,
}

/// Column indices for one of the supported header layouts.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    home: usize,
    away: usize,
    home_goals: usize,
    away_goals: usize,
}

/// Reads a results CSV, mapping either the football-data.co.uk header set
/// (`HomeTeam`/`FTHG`) or the international one (`Home Team`/`Home Goals`).
/// Rows that fail to parse are dropped and counted, never fatal; an
/// unrecognized header layout is an error.
pub fn read_matches_csv(path: &Path) -> Result<CsvLoad> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open csv {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("read csv headers {}", path.display()))?
        .clone();
    let cols = detect_columns(&headers)
        .ok_or_else(|| anyhow!("unrecognized column layout in {}", path.display()))?;

    let mut matches = Vec::new();
    let mut rows_dropped = 0usize;
    for record in rdr.records() {
        let Ok(record) = record else {
            rows_dropped += 1;
            continue;
        };
        match parse_row(&record, cols) {
            Some(m) => matches.push(m),
            None => rows_dropped += 1,
        }
    }

    Ok(CsvLoad {
        matches,
        rows_dropped,
    })
}

fn detect_columns(headers: &StringRecord) -> Option<ColumnMap> {
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);

    if find("HomeTeam").is_some() {
        return Some(ColumnMap {
            date: find("Date")?,
            home: find("HomeTeam")?,
            away: find("AwayTeam")?,
            home_goals: find("FTHG")?,
            away_goals: find("FTAG")?,
        });
    }
    if find("Home Team").is_some() {
        return Some(ColumnMap {
            date: find("Date")?,
            home: find("Home Team")?,
            away: find("Away Team")?,
            home_goals: find("Home Goals")?,
            away_goals: find("Away Goals")?,
        });
    }
    None
}

fn parse_row(record: &StringRecord, cols: ColumnMap) -> Option<MatchResult> {
    let date = parse_date(record.get(cols.date)?)?;
    let home = record.get(cols.home)?.trim();
    let away = record.get(cols.away)?.trim();
    if home.is_empty() || away.is_empty() {
        return None;
    }
    let home_goals = parse_goals(record.get(cols.home_goals)?)?;
    let away_goals = parse_goals(record.get(cols.away_goals)?)?;

    Some(MatchResult {
        date,
        home: home.to_string(),
        away: away.to_string(),
        home_goals,
        away_goals,
    })
}

/// Day-first formats seen across the source datasets.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"];
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_goals(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    // Some exports carry full-time goals as "2.0".
    let f = s.parse::<f64>().ok()?;
    if f >= 0.0 && f.fract() == 0.0 {
        Some(f as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn detects_football_data_layout() {
        let headers = record(&["Div", "Date", "HomeTeam", "AwayTeam", "FTHG", "FTAG"]);
        let cols = detect_columns(&headers).expect("layout should be recognized");
        assert_eq!(cols.date, 1);
        assert_eq!(cols.home, 2);
        assert_eq!(cols.home_goals, 4);
    }

    #[test]
    fn detects_international_layout() {
        let headers = record(&["Date", "Home Team", "Away Team", "Home Goals", "Away Goals"]);
        let cols = detect_columns(&headers).expect("layout should be recognized");
        assert_eq!(cols.away, 2);
        assert_eq!(cols.away_goals, 4);
    }

    #[test]
    fn rejects_unknown_layout() {
        let headers = record(&["when", "who", "versus", "score"]);
        assert!(detect_columns(&headers).is_none());
    }

    #[test]
    fn parse_date_is_day_first() {
        let iso = parse_date("2023-08-11").unwrap();
        let uk = parse_date("11/08/2023").unwrap();
        let short = parse_date("11/08/23").unwrap();
        assert_eq!(iso, uk);
        assert_eq!(iso, short);
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn parse_goals_accepts_float_exports() {
        assert_eq!(parse_goals("3"), Some(3));
        assert_eq!(parse_goals("2.0"), Some(2));
        assert_eq!(parse_goals("1.5"), None);
        assert_eq!(parse_goals("-1"), None);
        assert_eq!(parse_goals("n/a"), None);
    }

    #[test]
    fn row_without_team_name_is_dropped() {
        let headers = record(&["Date", "HomeTeam", "AwayTeam", "FTHG", "FTAG"]);
        let cols = detect_columns(&headers).unwrap();
        let row = record(&["2023-08-11", "", "Arsenal", "1", "0"]);
        assert!(parse_row(&row, cols).is_none());
    }
}
