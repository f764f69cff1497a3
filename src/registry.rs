//! Team reference data loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// One entry of the reference file.
#[derive(Debug, Deserialize)]
struct TeamEntry {
    id: i64,
    name: String,
}

/// Immutable mapping of team id to display name.
///
/// Built once at startup and shared by reference into every handler. It is
/// never mutated afterwards, so concurrent lookups need no synchronization.
#[derive(Debug, Default)]
pub struct TeamRegistry {
    teams: HashMap<i64, String>,
}

impl TeamRegistry {
    /// Load the registry from a JSON array of `{id, name}` objects.
    ///
    /// A missing or malformed file yields an empty registry: the process
    /// keeps running, every subsequent lookup fails and is logged by the
    /// caller.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "team reference file unreadable, starting with empty registry");
                return Self::default();
            }
        };

        match serde_json::from_str::<Vec<TeamEntry>>(&raw) {
            Ok(entries) => {
                let teams = entries.into_iter().map(|t| (t.id, t.name)).collect();
                Self { teams }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "team reference file malformed, starting with empty registry");
                Self::default()
            }
        }
    }

    /// Build a registry from in-memory entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (i64, String)>) -> Self {
        Self {
            teams: entries.into_iter().collect(),
        }
    }

    /// Look up the display name for a team id.
    pub fn name(&self, id: i64) -> Option<&str> {
        self.teams.get(&id).map(String::as_str)
    }

    /// Number of known teams.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether the registry holds no teams.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_registry() {
        let registry = TeamRegistry::load("does/not/exist.json");

        assert!(registry.is_empty());
        assert_eq!(registry.name(33), None);
    }

    #[test]
    fn malformed_file_yields_empty_registry() {
        let dir = std::env::temp_dir();
        let path = dir.join("odds_processor_malformed_teams.json");
        std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let registry = TeamRegistry::load(&path);

        assert!(registry.is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn lookups_are_pure_and_repeatable() {
        let registry = TeamRegistry::from_entries([
            (33, "Manchester United".to_string()),
            (40, "Liverpool".to_string()),
        ]);

        for _ in 0..3 {
            assert_eq!(registry.name(33), Some("Manchester United"));
            assert_eq!(registry.name(40), Some("Liverpool"));
            assert_eq!(registry.name(999), None);
        }
        assert_eq!(registry.len(), 2);
    }
}
