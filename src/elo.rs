use std::collections::HashMap;

use crate::dataset::MatchResult;

#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub base: f64,
    pub k: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            base: 1500.0,
            k: 20.0,
        }
    }
}

/// Per-team ratings for one league. Mutated only through `apply_result`,
/// strictly in chronological replay order; afterwards the table is frozen
/// into the league bundle.
#[derive(Debug, Clone)]
pub struct EloTable {
    cfg: EloConfig,
    ratings: HashMap<String, f64>,
}

impl EloTable {
    pub fn new(cfg: EloConfig) -> Self {
        Self {
            cfg,
            ratings: HashMap::new(),
        }
    }

    /// Current rating; unseen teams read as the configured base without
    /// materializing an entry.
    pub fn rating(&self, team: &str) -> f64 {
        self.ratings.get(team).copied().unwrap_or(self.cfg.base)
    }

    pub fn contains(&self, team: &str) -> bool {
        self.ratings.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// One deterministic, order-sensitive update. The two deltas cancel
    /// exactly: actual scores sum to 1 and expected scores sum to 1.
    pub fn apply_result(&mut self, home: &str, away: &str, home_goals: u32, away_goals: u32) {
        let rating_home = self.rating(home);
        let rating_away = self.rating(away);

        let actual_home = if home_goals > away_goals {
            1.0
        } else if home_goals < away_goals {
            0.0
        } else {
            0.5
        };
        let expected_home = expected_score(rating_home, rating_away);

        let delta = self.cfg.k * (actual_home - expected_home);
        self.ratings.insert(home.to_string(), rating_home + delta);
        self.ratings.insert(away.to_string(), rating_away - delta);
    }

    /// Ordered fold over an already date-sorted slice.
    pub fn replay(&mut self, matches: &[MatchResult]) {
        for m in matches {
            self.apply_result(&m.home, &m.away, m.home_goals, m.away_goals);
        }
    }

    pub fn snapshot(&self) -> &HashMap<String, f64> {
        &self.ratings
    }

    pub fn into_snapshot(self) -> HashMap<String, f64> {
        self.ratings
    }
}

pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((r_b - r_a) / 400.0))
}
