use std::collections::HashMap;

use chrono::NaiveDate;

use crate::dataset::MatchResult;

pub const FORM_WINDOW: usize = 5;
pub const GOALS_WINDOW: usize = 10;

/// A team's most recent rolling form, as of its last played match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamForm {
    pub pts_last5: f64,
    pub gf_last10: f64,
    pub ga_last10: f64,
}

/// One match seen from one team's perspective.
#[derive(Debug, Clone, Copy)]
struct TeamRow<'a> {
    team: &'a str,
    date: NaiveDate,
    goals_for: u32,
    goals_against: u32,
}

impl TeamRow<'_> {
    fn points(&self) -> f64 {
        if self.goals_for > self.goals_against {
            3.0
        } else if self.goals_for < self.goals_against {
            0.0
        } else {
            1.0
        }
    }
}

/// Expands each match into two perspective records, orders every team's own
/// records chronologically, and keeps the trailing-window averages of the
/// final record only. Windows shrink to however many matches exist, so a
/// team's first match is its own form.
pub fn compute_rolling_form(matches: &[MatchResult]) -> HashMap<String, TeamForm> {
    // Home perspectives first, then away; the stable per-team sort below
    // keeps that order for same-day rows.
    let mut rows: Vec<TeamRow<'_>> = Vec::with_capacity(matches.len() * 2);
    for m in matches {
        rows.push(TeamRow {
            team: &m.home,
            date: m.date,
            goals_for: m.home_goals,
            goals_against: m.away_goals,
        });
    }
    for m in matches {
        rows.push(TeamRow {
            team: &m.away,
            date: m.date,
            goals_for: m.away_goals,
            goals_against: m.home_goals,
        });
    }

    let mut by_team: HashMap<&str, Vec<TeamRow<'_>>> = HashMap::new();
    for row in rows {
        by_team.entry(row.team).or_default().push(row);
    }

    let mut out = HashMap::with_capacity(by_team.len());
    for (team, mut rows) in by_team {
        rows.sort_by_key(|r| r.date);
        let points: Vec<f64> = rows.iter().map(TeamRow::points).collect();
        let goals_for: Vec<f64> = rows.iter().map(|r| f64::from(r.goals_for)).collect();
        let goals_against: Vec<f64> = rows.iter().map(|r| f64::from(r.goals_against)).collect();
        out.insert(
            team.to_string(),
            TeamForm {
                pts_last5: trailing_mean(&points, FORM_WINDOW),
                gf_last10: trailing_mean(&goals_for, GOALS_WINDOW),
                ga_last10: trailing_mean(&goals_against, GOALS_WINDOW),
            },
        );
    }
    out
}

fn trailing_mean(values: &[f64], window: usize) -> f64 {
    let take = values.len().min(window);
    if take == 0 {
        return 0.0;
    }
    let sum: f64 = values[values.len() - take..].iter().sum();
    sum / take as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(day: u32, home: &str, away: &str, hg: u32, ag: u32) -> MatchResult {
        MatchResult {
            date: NaiveDate::from_ymd_opt(2023, 10, day).unwrap(),
            home: home.to_string(),
            away: away.to_string(),
            home_goals: hg,
            away_goals: ag,
        }
    }

    #[test]
    fn single_match_is_its_own_form() {
        let form = compute_rolling_form(&[m(1, "Team A", "Team B", 3, 1)]);
        let a = form["Team A"];
        assert_eq!(a.pts_last5, 3.0);
        assert_eq!(a.gf_last10, 3.0);
        assert_eq!(a.ga_last10, 1.0);

        let b = form["Team B"];
        assert_eq!(b.pts_last5, 0.0);
        assert_eq!(b.gf_last10, 1.0);
        assert_eq!(b.ga_last10, 3.0);
    }

    #[test]
    fn home_and_away_matches_interleave_by_date() {
        // Team A: win at home (day 1), loss away (day 2), draw at home (day 3).
        let matches = vec![
            m(1, "Team A", "Team B", 2, 0),
            m(2, "Team C", "Team A", 1, 0),
            m(3, "Team A", "Team D", 1, 1),
        ];
        let a = compute_rolling_form(&matches)["Team A"];
        assert_eq!(a.pts_last5, (3.0 + 0.0 + 1.0) / 3.0);
        assert_eq!(a.gf_last10, (2.0 + 0.0 + 1.0) / 3.0);
        assert_eq!(a.ga_last10, (0.0 + 1.0 + 1.0) / 3.0);
    }

    #[test]
    fn points_window_is_five_goals_window_is_ten() {
        // Seven straight home wins for Team A, goals climbing 1..=7.
        let matches: Vec<MatchResult> = (1..=7)
            .map(|day| m(day, "Team A", "Team B", day, 0))
            .collect();
        let a = compute_rolling_form(&matches)["Team A"];
        // All seven wins fall inside the goals window, only the last five
        // inside the points window.
        assert_eq!(a.pts_last5, 3.0);
        assert_eq!(a.gf_last10, (1..=7).sum::<u32>() as f64 / 7.0);
        assert_eq!(a.ga_last10, 0.0);
    }

    #[test]
    fn only_the_latest_row_survives() {
        let matches = vec![
            m(1, "Team A", "Team B", 5, 0),
            m(20, "Team B", "Team A", 2, 2),
        ];
        let form = compute_rolling_form(&matches);
        // Averages cover both matches, not just the first.
        assert_eq!(form["Team A"].pts_last5, 2.0);
        assert_eq!(form["Team B"].pts_last5, 0.5);
        assert_eq!(form["Team A"].gf_last10, 3.5);
    }
}
