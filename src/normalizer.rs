//! Conversion of final-score odds into de-margined match-outcome odds.
//!
//! The arithmetic matches the upstream odds provider: implied probability is
//! `1 / (odd + 1)`, not the textbook `1 / odd`. Downstream consumers depend
//! on the resulting values, so the convention is kept as-is.

use crate::error::NormalizationError;
use crate::model::ScoreOddsMap;

/// Fair three-way outcome odds for one match.
///
/// The implied probabilities `1 / home_win + 1 / draw + 1 / away_win` sum to
/// 1.0 within floating tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeOdds {
    /// Fair odd for a home win.
    pub home_win: f64,
    /// Fair odd for a draw.
    pub draw: f64,
    /// Fair odd for an away win.
    pub away_win: f64,
}

/// Parse a `"H-A"` score string into goal counts.
fn parse_score(score: &str) -> Result<(u32, u32), NormalizationError> {
    let malformed = || NormalizationError::MalformedScore {
        score: score.to_string(),
    };

    let (home, away) = score.split_once('-').ok_or_else(malformed)?;
    let home = home.trim().parse::<u32>().map_err(|_| malformed())?;
    let away = away.trim().parse::<u32>().map_err(|_| malformed())?;

    Ok((home, away))
}

/// Normalize a set of per-score odds into three fair outcome odds.
///
/// Each score's implied probability lands in the home-win, draw, or away-win
/// bucket according to its goal counts. Bucket sums are rescaled by the
/// grand total so the three probabilities sum to exactly 1, removing the
/// bookmaker's margin, then converted back to odds.
///
/// A single malformed score string fails the whole match entry; there is no
/// partial salvage.
pub fn normalize(score_odds: &ScoreOddsMap) -> Result<OutcomeOdds, NormalizationError> {
    let mut home_prob = 0.0;
    let mut away_prob = 0.0;
    let mut draw_prob = 0.0;

    for (score, odd) in score_odds {
        let probability = 1.0 / (odd + 1.0);
        let (home_goals, away_goals) = parse_score(score)?;

        if home_goals > away_goals {
            home_prob += probability;
        } else if home_goals < away_goals {
            away_prob += probability;
        } else {
            draw_prob += probability;
        }
    }

    let total = home_prob + away_prob + draw_prob;
    if total == 0.0 {
        return Err(NormalizationError::ZeroTotalProbability);
    }

    Ok(OutcomeOdds {
        home_win: 1.0 / (home_prob / total),
        draw: 1.0 / (draw_prob / total),
        away_win: 1.0 / (away_prob / total),
    })
}
