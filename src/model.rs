//! Domain records flowing through the pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalizer::OutcomeOdds;

/// Version stamp written into every persisted record.
pub const RECORD_VERSION: &str = "1.0.0";

/// Per-score decimal odds for one match, keyed by `"H-A"` score string.
pub type ScoreOddsMap = HashMap<String, f64>;

/// A match entry extracted from an inbound message, before normalization.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// Provider-assigned fixture id.
    pub fixture_id: i32,
    /// Home team id.
    pub home_team_id: i32,
    /// Home team display name, resolved from the registry.
    pub home_team_name: String,
    /// Away team id.
    pub away_team_id: i32,
    /// Away team display name, resolved from the registry.
    pub away_team_name: String,
    /// "Final Score" odds by score string.
    pub score_odds: ScoreOddsMap,
}

/// Labeled outcome odds as persisted and served: two fraction digits each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultOdds {
    /// Fair odd for a home win.
    #[serde(rename = "Home Win")]
    pub home_win: String,
    /// Fair odd for a draw.
    #[serde(rename = "Draw")]
    pub draw: String,
    /// Fair odd for an away win.
    #[serde(rename = "Away Win")]
    pub away_win: String,
}

impl From<OutcomeOdds> for ResultOdds {
    fn from(odds: OutcomeOdds) -> Self {
        Self {
            home_win: format!("{:.2}", odds.home_win),
            draw: format!("{:.2}", odds.draw),
            away_win: format!("{:.2}", odds.away_win),
        }
    }
}

/// One persisted match record, keyed by fixture id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Fixture id (primary key).
    pub id: i32,
    /// Home team id.
    pub home_team_id: i32,
    /// Home team display name.
    pub home_team_name: String,
    /// Away team id.
    pub away_team_id: i32,
    /// Away team display name.
    pub away_team_name: String,
    /// Normalized three-way outcome odds.
    pub result_odds: ResultOdds,
    /// When this record was computed.
    pub update_timestamp: DateTime<Utc>,
    /// Record format version.
    pub version: String,
}

impl MatchRecord {
    /// Build a record from a parsed candidate and its normalized odds,
    /// stamped with the current time.
    pub fn from_candidate(candidate: &MatchCandidate, odds: OutcomeOdds) -> Self {
        Self {
            id: candidate.fixture_id,
            home_team_id: candidate.home_team_id,
            home_team_name: candidate.home_team_name.clone(),
            away_team_id: candidate.away_team_id,
            away_team_name: candidate.away_team_name.clone(),
            result_odds: odds.into(),
            update_timestamp: Utc::now(),
            version: RECORD_VERSION.to_string(),
        }
    }
}
