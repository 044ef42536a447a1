use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::elo::EloTable;

const ELO_WEIGHT: f64 = 0.55;
const POWER_WEIGHT: f64 = 0.45;
const DRAW_WEIGHT: f64 = 0.22;
const POWER_SCALE: f64 = 12.0;
const INJURY_IMPACT_STEP: f64 = 0.5;

/// Power score substituted for a team absent from the snapshot.
pub const NEUTRAL_POWER: f64 = 50.0;
pub const DEFAULT_REST_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Gk,
    Def,
    #[default]
    Mid,
    Att,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Injury {
    pub name: String,
    #[serde(default)]
    pub position: Position,
    /// Severity on a 1-10 scale.
    #[serde(default = "default_impact")]
    pub impact: u8,
}

fn default_impact() -> u8 {
    5
}

/// What a team-absent power lookup should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTeam {
    /// Substitute the neutral score; the lookup always succeeds.
    NeutralDefault,
    /// Report the absence to the caller.
    Strict,
}

/// Contextual inputs for one fixture. Defaults to full squads on a normal
/// week of rest.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub home_injuries: Vec<Injury>,
    pub away_injuries: Vec<Injury>,
    pub home_rest_days: i64,
    pub away_rest_days: i64,
}

impl Default for MatchContext {
    fn default() -> Self {
        Self {
            home_injuries: Vec::new(),
            away_injuries: Vec::new(),
            home_rest_days: DEFAULT_REST_DAYS,
            away_rest_days: DEFAULT_REST_DAYS,
        }
    }
}

/// Three-outcome distribution plus the diagnostics that produced it.
/// Probabilities are fractions and sum to 1.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub home: String,
    pub away: String,
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub elo_diff: f64,
    pub power_diff: f64,
    pub home_penalty: f64,
    pub away_penalty: f64,
    pub home_fatigue: f64,
    pub away_fatigue: f64,
}

/// Frozen view over one league's ratings and power scores. Never fails:
/// absent teams fall back to base rating and neutral power, so membership
/// checks belong to the serving boundary.
#[derive(Debug, Clone)]
pub struct MatchPredictor {
    ratings: EloTable,
    power: HashMap<String, f64>,
}

impl MatchPredictor {
    pub fn new(ratings: EloTable, power: HashMap<String, f64>) -> Self {
        Self { ratings, power }
    }

    pub fn knows(&self, team: &str) -> bool {
        self.power.contains_key(team)
    }

    pub fn power_score(&self, team: &str, missing: MissingTeam) -> Option<f64> {
        match self.power.get(team) {
            Some(score) => Some(*score),
            None => match missing {
                MissingTeam::NeutralDefault => Some(NEUTRAL_POWER),
                MissingTeam::Strict => None,
            },
        }
    }

    pub fn predict(&self, home: &str, away: &str, ctx: &MatchContext) -> Prediction {
        let elo_diff = self.ratings.rating(home) - self.ratings.rating(away);
        let prob_elo = 1.0 / (1.0 + 10.0_f64.powf(-elo_diff / 400.0));

        let home_penalty = injury_penalty(&ctx.home_injuries);
        let away_penalty = injury_penalty(&ctx.away_injuries);
        let home_fatigue = fatigue_penalty(ctx.home_rest_days);
        let away_fatigue = fatigue_penalty(ctx.away_rest_days);

        let power_home = self
            .power_score(home, MissingTeam::NeutralDefault)
            .unwrap_or(NEUTRAL_POWER)
            - home_penalty
            - home_fatigue;
        let power_away = self
            .power_score(away, MissingTeam::NeutralDefault)
            .unwrap_or(NEUTRAL_POWER)
            - away_penalty
            - away_fatigue;

        let power_diff = power_home - power_away;
        let prob_power = 1.0 / (1.0 + (-power_diff / POWER_SCALE).exp());

        let raw_home = ELO_WEIGHT * prob_elo + POWER_WEIGHT * prob_power;
        let raw_away = 1.0 - raw_home;
        let total = raw_home + raw_away + DRAW_WEIGHT;

        Prediction {
            home: home.to_string(),
            away: away.to_string(),
            home_win: raw_home / total,
            draw: DRAW_WEIGHT / total,
            away_win: raw_away / total,
            elo_diff,
            power_diff,
            home_penalty,
            away_penalty,
            home_fatigue,
            away_fatigue,
        }
    }
}

pub fn injury_penalty(injuries: &[Injury]) -> f64 {
    injuries
        .iter()
        .map(|i| f64::from(i.impact) * INJURY_IMPACT_STEP)
        .sum()
}

/// Power-score penalty from days since the last match. Positive values are
/// subtracted; a long rest turns into a bonus.
pub fn fatigue_penalty(rest_days: i64) -> f64 {
    if rest_days < 3 {
        4.0
    } else if rest_days == 3 {
        2.0
    } else if rest_days > 7 {
        -2.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elo::EloConfig;

    fn injury(impact: u8) -> Injury {
        Injury {
            name: format!("Player {impact}"),
            position: Position::default(),
            impact,
        }
    }

    fn predictor_with_power(pairs: &[(&str, f64)]) -> MatchPredictor {
        let ratings = EloTable::new(EloConfig::default());
        let power = pairs
            .iter()
            .map(|(team, score)| ((*team).to_string(), *score))
            .collect();
        MatchPredictor::new(ratings, power)
    }

    fn symmetric_predictor() -> MatchPredictor {
        let ratings = EloTable::new(EloConfig::default());
        let power = HashMap::from([
            ("Team A".to_string(), 60.0),
            ("Team B".to_string(), 60.0),
        ]);
        MatchPredictor::new(ratings, power)
    }

    #[test]
    fn probabilities_sum_to_one() {
        let p = predictor_with_power(&[("Team A", 80.0), ("Team B", 30.0)]);
        let ctx = MatchContext {
            home_injuries: vec![injury(7), injury(3)],
            away_injuries: Vec::new(),
            home_rest_days: 2,
            away_rest_days: 12,
        };
        let pred = p.predict("Team A", "Team B", &ctx);
        assert!((pred.home_win + pred.draw + pred.away_win - 1.0).abs() < 1e-9);
    }

    #[test]
    fn symmetric_inputs_split_evenly() {
        let p = symmetric_predictor();
        let pred = p.predict("Team A", "Team B", &MatchContext::default());
        assert!((pred.home_win - pred.away_win).abs() < 1e-12);
        // Raw sides always sum to 1, so the draw share is fixed.
        assert!((pred.draw - DRAW_WEIGHT / (1.0 + DRAW_WEIGHT)).abs() < 1e-12);
        assert_eq!(pred.elo_diff, 0.0);
        assert_eq!(pred.power_diff, 0.0);
    }

    #[test]
    fn unknown_team_defaults_to_neutral_power() {
        let p = symmetric_predictor();
        assert_eq!(p.power_score("Nowhere FC", MissingTeam::Strict), None);
        assert_eq!(
            p.power_score("Nowhere FC", MissingTeam::NeutralDefault),
            Some(NEUTRAL_POWER)
        );
        // Prediction still works against a team missing from the snapshot.
        let pred = p.predict("Team A", "Nowhere FC", &MatchContext::default());
        assert!((pred.home_win + pred.draw + pred.away_win - 1.0).abs() < 1e-9);
        assert!(pred.home_win > pred.away_win);
    }

    #[test]
    fn fatigue_schedule_matches_rest_days() {
        assert_eq!(fatigue_penalty(0), 4.0);
        assert_eq!(fatigue_penalty(2), 4.0);
        assert_eq!(fatigue_penalty(3), 2.0);
        assert_eq!(fatigue_penalty(5), 0.0);
        assert_eq!(fatigue_penalty(7), 0.0);
        assert_eq!(fatigue_penalty(8), -2.0);
        assert_eq!(fatigue_penalty(30), -2.0);
    }

    #[test]
    fn fatigue_flows_into_diagnostics_and_scores() {
        let p = symmetric_predictor();
        let ctx = MatchContext {
            home_rest_days: 2,
            away_rest_days: 10,
            ..MatchContext::default()
        };
        let pred = p.predict("Team A", "Team B", &ctx);
        assert_eq!(pred.home_fatigue, 4.0);
        assert_eq!(pred.away_fatigue, -2.0);
        // Home dropped by 4, away lifted by 2.
        assert_eq!(pred.power_diff, -6.0);
        assert!(pred.home_win < pred.away_win);
    }

    #[test]
    fn injuries_cost_half_a_point_per_impact() {
        assert_eq!(injury_penalty(&[]), 0.0);
        assert_eq!(injury_penalty(&[injury(5)]), 2.5);
        assert_eq!(injury_penalty(&[injury(10), injury(1)]), 5.5);

        let p = symmetric_predictor();
        let ctx = MatchContext {
            home_injuries: vec![injury(10), injury(1)],
            ..MatchContext::default()
        };
        let pred = p.predict("Team A", "Team B", &ctx);
        assert_eq!(pred.home_penalty, 5.5);
        assert_eq!(pred.away_penalty, 0.0);
        assert_eq!(pred.power_diff, -5.5);
        assert!(pred.home_win < pred.away_win);
    }

    #[test]
    fn higher_rating_raises_home_chances() {
        let mut ratings = EloTable::new(EloConfig::default());
        for _ in 0..5 {
            ratings.apply_result("Team A", "Team B", 2, 0);
        }
        let power = HashMap::from([
            ("Team A".to_string(), 50.0),
            ("Team B".to_string(), 50.0),
        ]);
        let p = MatchPredictor::new(ratings, power);
        let pred = p.predict("Team A", "Team B", &MatchContext::default());
        assert!(pred.elo_diff > 0.0);
        assert!(pred.home_win > pred.away_win);
    }

    #[test]
    fn injury_defaults_deserialize() {
        let raw = r#"{"name": "Anyone"}"#;
        let injury: Injury = serde_json::from_str(raw).unwrap();
        assert_eq!(injury.position, Position::Mid);
        assert_eq!(injury.impact, 5);

        let raw = r#"{"name": "Keeper", "position": "GK", "impact": 9}"#;
        let injury: Injury = serde_json::from_str(raw).unwrap();
        assert_eq!(injury.position, Position::Gk);
        assert_eq!(injury.impact, 9);
    }
}
