use anyhow::{Result, anyhow};

use crate::league::LeagueBundle;
use crate::predictor::MatchContext;

/// Probability-point gap past which one side is called the favourite.
const FAVOURITE_GAP: f64 = 20.0;

/// A short human-readable preview built from the bundle's own numbers, no
/// external text source.
pub fn generate_match_preview(bundle: &LeagueBundle, home: &str, away: &str) -> Result<String> {
    let home_row = bundle
        .row(home)
        .ok_or_else(|| anyhow!("unknown team name: {home}"))?;
    let away_row = bundle
        .row(away)
        .ok_or_else(|| anyhow!("unknown team name: {away}"))?;

    let pred = bundle.predictor.predict(home, away, &MatchContext::default());
    let home_prob = pred.home_win * 100.0;
    let draw_prob = pred.draw * 100.0;
    let away_prob = pred.away_win * 100.0;

    let mut parts = Vec::new();
    parts.push(format!("{home} host {away}."));
    parts.push(format!(
        "{home} have a Power Score of {:.1} (Elo {:.0}), while {away} sit at {:.1} (Elo {:.0}).",
        home_row.power_score, home_row.elo, away_row.power_score, away_row.elo
    ));
    parts.push(format!(
        "Last 10: {home} {:.1}/{:.1} vs {away} {:.1}/{:.1}.",
        home_row.gf_last10, home_row.ga_last10, away_row.gf_last10, away_row.ga_last10
    ));
    parts.push(format!(
        "Our model: {home} {home_prob:.1}% — Draw {draw_prob:.1}% — {away} {away_prob:.1}%."
    ));

    if home_prob - away_prob > FAVOURITE_GAP {
        parts.push(format!(
            "{home} are clear favourites; expect them to dominate possession and chances."
        ));
    } else if away_prob - home_prob > FAVOURITE_GAP {
        parts.push(format!(
            "{away} are the clear favourites and should exploit {home}'s defensive weaknesses."
        ));
    } else {
        parts.push("Looks competitive — moments and finishing will decide.".to_string());
    }

    Ok(parts.join("\n"))
}
