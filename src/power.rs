use std::cmp::Ordering;
use std::collections::HashMap;

use crate::elo::EloTable;
use crate::features::TeamForm;

/// Blend weights over the normalized metric columns.
const W_ELO: f64 = 0.40;
const W_ATTACK: f64 = 0.25;
const W_DEFENCE: f64 = 0.20;
const W_FORM: f64 = 0.15;

/// Normalized value used when a metric has no spread across the league.
const NEUTRAL_NORM: f64 = 0.5;

/// One line of the league power table, ordered by `power_score` descending.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerRow {
    pub team: String,
    pub power_score: f64,
    pub elo: f64,
    pub gf_last10: f64,
    pub ga_last10: f64,
    pub pts_last5: f64,
}

/// Blends ratings and rolling form into one [0,100] score per team.
///
/// Each raw metric is min-max normalized over the league's current team set
/// before blending, and the blended composite is min-max rescaled again, so
/// the final score keeps a stable range no matter the absolute Elo or goal
/// magnitudes. Recomputed in full on every league load.
pub fn build_power_table(ratings: &EloTable, form: &HashMap<String, TeamForm>) -> Vec<PowerRow> {
    let mut teams: Vec<&String> = form.keys().collect();
    teams.sort();

    let elo_raw: Vec<f64> = teams.iter().map(|t| ratings.rating(t)).collect();
    let attack_raw: Vec<f64> = teams.iter().map(|t| form[*t].gf_last10).collect();
    // Negated so that conceding less reads as a higher strength.
    let defence_raw: Vec<f64> = teams.iter().map(|t| -form[*t].ga_last10).collect();
    let form_raw: Vec<f64> = teams.iter().map(|t| form[*t].pts_last5).collect();

    let elo_norm = min_max_normalize(&elo_raw);
    let attack_norm = min_max_normalize(&attack_raw);
    let defence_norm = min_max_normalize(&defence_raw);
    let form_norm = min_max_normalize(&form_raw);

    let raw_power: Vec<f64> = (0..teams.len())
        .map(|i| {
            W_ELO * elo_norm[i]
                + W_ATTACK * attack_norm[i]
                + W_DEFENCE * defence_norm[i]
                + W_FORM * form_norm[i]
        })
        .collect();
    let power: Vec<f64> = min_max_normalize(&raw_power)
        .into_iter()
        .map(|v| v * 100.0)
        .collect();

    let mut rows: Vec<PowerRow> = teams
        .iter()
        .enumerate()
        .map(|(i, team)| PowerRow {
            team: (*team).clone(),
            power_score: power[i],
            elo: elo_raw[i],
            gf_last10: attack_raw[i],
            ga_last10: form[*team].ga_last10,
            pts_last5: form_raw[i],
        })
        .collect();

    rows.sort_by(|a, b| {
        b.power_score
            .partial_cmp(&a.power_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });
    rows
}

pub fn power_lookup(rows: &[PowerRow]) -> HashMap<String, f64> {
    rows.iter()
        .map(|r| (r.team.clone(), r.power_score))
        .collect()
}

/// Min-max to [0,1]; a column with no spread pins every team to 0.5 rather
/// than dividing by zero.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let Some(first) = values.first() else {
        return Vec::new();
    };
    let mut mn = *first;
    let mut mx = *first;
    for v in values {
        mn = mn.min(*v);
        mx = mx.max(*v);
    }
    if mn == mx {
        return vec![NEUTRAL_NORM; values.len()];
    }
    values.iter().map(|v| (v - mn) / (mx - mn)).collect()
}
