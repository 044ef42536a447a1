//! Team strength ratings and match outcome probabilities for independent
//! football leagues, built from historical results CSVs.

pub mod dataset;
pub mod elo;
pub mod features;
pub mod league;
pub mod power;
pub mod predictor;
pub mod preview;
pub mod sports_api;
pub mod team_map;
