//! Parsing of inbound odds messages into match candidates.
//!
//! Fields are probed with explicit presence checks: a value that is simply
//! absent skips the one entry, only syntactically broken payloads abort the
//! whole message.

use serde_json::Value;
use tracing::warn;

use crate::error::{EntryError, ParseError};
use crate::model::{MatchCandidate, ScoreOddsMap};
use crate::registry::TeamRegistry;

/// The only odds sub-market this service consumes.
const FINAL_SCORE_MARKET: &str = "Final Score";

/// Parse one inbound message into match candidates.
///
/// Fails with a message-level [`ParseError`] when the payload is not valid
/// JSON or has no `content.response` array. Entries that fail individually
/// are logged and skipped; their siblings are unaffected.
pub fn parse_message(
    text: &str,
    registry: &TeamRegistry,
) -> Result<Vec<MatchCandidate>, ParseError> {
    let root: Value = serde_json::from_str(text)?;

    let response = root
        .pointer("/content/response")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingResponse)?;

    let mut candidates = Vec::with_capacity(response.len());
    for entry in response {
        match parse_entry(entry, registry) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!(error = %e, "skipping match entry"),
        }
    }

    Ok(candidates)
}

/// Parse a single `response` entry into a candidate.
fn parse_entry(entry: &Value, registry: &TeamRegistry) -> Result<MatchCandidate, EntryError> {
    let home_team_id = int_field(entry, "/teams/home/id", "teams.home.id")?;
    let away_team_id = int_field(entry, "/teams/away/id", "teams.away.id")?;
    let fixture_id = int_field(entry, "/fixture/id", "fixture.id")?;

    let home_team_name = registry
        .name(i64::from(home_team_id))
        .ok_or(EntryError::UnknownTeam {
            team_id: i64::from(home_team_id),
        })?
        .to_string();
    let away_team_name = registry
        .name(i64::from(away_team_id))
        .ok_or(EntryError::UnknownTeam {
            team_id: i64::from(away_team_id),
        })?
        .to_string();

    let odds = entry
        .get("odds")
        .and_then(Value::as_array)
        .ok_or(EntryError::FieldMissing { field: "odds" })?;

    let score_odds = extract_final_score_odds(odds);
    if score_odds.is_empty() {
        return Err(EntryError::ZeroOdds);
    }

    Ok(MatchCandidate {
        fixture_id,
        home_team_id,
        home_team_name,
        away_team_id,
        away_team_name,
        score_odds,
    })
}

/// Read a required integer field at `pointer`, reporting `field` on absence.
fn int_field(entry: &Value, pointer: &str, field: &'static str) -> Result<i32, EntryError> {
    entry
        .pointer(pointer)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(EntryError::FieldMissing { field })
}

/// Collect `value -> odd` pairs from every "Final Score" market entry.
///
/// Pairs with a missing or unparseable component are ignored.
fn extract_final_score_odds(odds: &[Value]) -> ScoreOddsMap {
    let mut score_odds = ScoreOddsMap::new();

    for market in odds {
        if market.get("name").and_then(Value::as_str) != Some(FINAL_SCORE_MARKET) {
            continue;
        }

        let Some(values) = market.get("values").and_then(Value::as_array) else {
            continue;
        };

        for pair in values {
            let Some(score) = pair.get("value").and_then(Value::as_str) else {
                continue;
            };
            let Some(odd) = pair.get("odd").and_then(Value::as_str) else {
                continue;
            };

            if let Some(odd) = parse_decimal(odd) {
                score_odds.insert(score.to_string(), odd);
            }
        }
    }

    score_odds
}

/// Parse a decimal string, accepting both `.` and `,` as the separator.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> TeamRegistry {
        TeamRegistry::from_entries([
            (33, "Manchester United".to_string()),
            (40, "Liverpool".to_string()),
            (42, "Arsenal".to_string()),
            (49, "Chelsea".to_string()),
        ])
    }

    fn entry(home: i64, away: i64, fixture: i64, odds: Value) -> Value {
        json!({
            "teams": { "home": { "id": home }, "away": { "id": away } },
            "fixture": { "id": fixture },
            "odds": odds,
        })
    }

    fn final_score_odds(values: &[(&str, &str)]) -> Value {
        let values: Vec<Value> = values
            .iter()
            .map(|(value, odd)| json!({ "value": value, "odd": odd }))
            .collect();
        json!([{ "name": "Final Score", "values": values }])
    }

    fn message(entries: Vec<Value>) -> String {
        json!({ "content": { "response": entries } }).to_string()
    }

    #[test]
    fn parses_a_complete_entry() {
        let text = message(vec![entry(
            33,
            40,
            867946,
            final_score_odds(&[("1-0", "2.5"), ("0-1", "3.0")]),
        )]);

        let candidates = parse_message(&text, &registry()).unwrap();

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.fixture_id, 867946);
        assert_eq!(candidate.home_team_name, "Manchester United");
        assert_eq!(candidate.away_team_name, "Liverpool");
        assert_eq!(candidate.score_odds.get("1-0"), Some(&2.5));
        assert_eq!(candidate.score_odds.get("0-1"), Some(&3.0));
    }

    #[test]
    fn accepts_comma_decimal_separator() {
        let text = message(vec![entry(
            33,
            40,
            1,
            final_score_odds(&[("2-1", "7,75")]),
        )]);

        let candidates = parse_message(&text, &registry()).unwrap();

        assert_eq!(candidates[0].score_odds.get("2-1"), Some(&7.75));
    }

    #[test]
    fn invalid_json_aborts_the_message() {
        let result = parse_message("{not json", &registry());

        assert!(matches!(result, Err(ParseError::InvalidJson(_))));
    }

    #[test]
    fn missing_response_path_aborts_the_message() {
        for text in [r#"{}"#, r#"{"content": {}}"#, r#"{"content": {"response": 1}}"#] {
            let result = parse_message(text, &registry());

            assert!(matches!(result, Err(ParseError::MissingResponse)));
        }
    }

    #[test]
    fn entry_with_missing_field_is_skipped() {
        let incomplete = json!({
            "teams": { "home": { "id": 33 } },
            "fixture": { "id": 2 },
            "odds": final_score_odds(&[("1-0", "2.0")]),
        });
        let text = message(vec![
            incomplete,
            entry(42, 49, 3, final_score_odds(&[("1-0", "2.0")])),
        ]);

        let candidates = parse_message(&text, &registry()).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].fixture_id, 3);
    }

    #[test]
    fn entry_with_unknown_team_is_skipped_but_siblings_survive() {
        let text = message(vec![
            entry(12345, 40, 4, final_score_odds(&[("1-0", "2.0")])),
            entry(42, 49, 5, final_score_odds(&[("0-0", "8.0")])),
        ]);

        let candidates = parse_message(&text, &registry()).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].fixture_id, 5);
        assert_eq!(candidates[0].home_team_name, "Arsenal");
    }

    #[test]
    fn entry_without_final_score_market_is_skipped() {
        let other_market = json!([{
            "name": "Match Winner",
            "values": [{ "value": "Home", "odd": "1.5" }],
        }]);
        let text = message(vec![entry(33, 40, 6, other_market)]);

        let candidates = parse_message(&text, &registry()).unwrap();

        assert!(candidates.is_empty());
    }

    #[test]
    fn unparseable_pairs_are_ignored() {
        let text = message(vec![entry(
            33,
            40,
            7,
            final_score_odds(&[("1-0", "not-a-number"), ("0-1", "3.25")]),
        )]);

        let candidates = parse_message(&text, &registry()).unwrap();

        assert_eq!(candidates[0].score_odds.len(), 1);
        assert_eq!(candidates[0].score_odds.get("0-1"), Some(&3.25));
    }
}
