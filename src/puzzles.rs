//! Puzzle catalog
//!
//! Puzzle definitions are plain JSON arrays:
//!
//! ```json
//! [{ "id": "open-file", "name": "Open File", "difficulty": 1,
//!    "maxPlayerValue": 6, "notationString": "k4/5/5/5/4K w", "solution": "a1a5" }]
//! ```
//!
//! A built-in set is compiled into the binary; `--puzzles <file>` replaces it.
//! The catalog only checks that ids are present and unique. Whether a
//! definition is playable is decided by the engine when it is loaded.

use crate::core::{CoreError, CoreResult};
use battler_engine::PuzzleDefinition;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Puzzles shipped with the binary
const BUILTIN_PUZZLES: &str = include_str!("../assets/puzzles.json");

#[derive(Debug, Clone, Default)]
pub struct PuzzleCatalog {
    puzzles: Vec<PuzzleDefinition>,
}

impl PuzzleCatalog {
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json(BUILTIN_PUZZLES)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        info!("[CATALOG] Loaded {} puzzles from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let puzzles: Vec<PuzzleDefinition> = serde_json::from_str(json)?;
        Self::from_puzzles(puzzles)
    }

    pub fn from_puzzles(puzzles: Vec<PuzzleDefinition>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for puzzle in &puzzles {
            if puzzle.id.trim().is_empty() {
                return Err(CoreError::Catalog {
                    message: format!("puzzle '{}' has an empty id", puzzle.name),
                });
            }
            if !seen.insert(puzzle.id.as_str()) {
                return Err(CoreError::Catalog {
                    message: format!("duplicate puzzle id '{}'", puzzle.id),
                });
            }
        }
        Ok(Self { puzzles })
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PuzzleDefinition> {
        self.puzzles.iter()
    }

    pub fn get(&self, id: &str) -> CoreResult<&PuzzleDefinition> {
        self.puzzles
            .iter()
            .find(|puzzle| puzzle.id == id)
            .ok_or_else(|| CoreError::UnknownPuzzle { id: id.to_string() })
    }

    /// Any puzzle, chosen uniformly
    pub fn random(&self) -> Option<&PuzzleDefinition> {
        self.puzzles.choose(&mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battler_engine::{GamePhase, GameSession};

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = PuzzleCatalog::builtin().expect("embedded catalog parses");
        assert!(!catalog.is_empty());
        assert!(catalog.get("sandbox").is_ok());
    }

    #[test]
    fn test_every_builtin_puzzle_is_playable() {
        //! Each embedded definition must load cleanly into a fresh engine.
        let catalog = PuzzleCatalog::builtin().expect("embedded catalog parses");
        for puzzle in catalog.iter() {
            let mut session = GameSession::default();
            session
                .start_puzzle(puzzle)
                .unwrap_or_else(|e| panic!("puzzle '{}' fails to load: {e}", puzzle.id));
            assert_eq!(session.phase(), GamePhase::Preparation);
            assert_eq!(session.notation(), puzzle.notation_string, "{} is canonical", puzzle.id);
        }
    }

    #[test]
    fn test_unknown_id() {
        let catalog = PuzzleCatalog::builtin().expect("embedded catalog parses");
        assert!(matches!(
            catalog.get("no-such-puzzle"),
            Err(CoreError::UnknownPuzzle { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "a", "name": "A", "difficulty": 1, "maxPlayerValue": 5, "notationString": "5/5/5/5/5 w"},
            {"id": "a", "name": "B", "difficulty": 1, "maxPlayerValue": 5, "notationString": "5/5/5/5/5 w"}
        ]"#;
        assert!(matches!(
            PuzzleCatalog::from_json(json),
            Err(CoreError::Catalog { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            PuzzleCatalog::from_json("{"),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("puzzles.json");
        fs::write(
            &path,
            r#"[{"id": "x", "name": "X", "difficulty": 4, "maxPlayerValue": 3, "notationString": "k4/5/5/5/4K w"}]"#,
        )
        .expect("write");

        let catalog = PuzzleCatalog::load(&path).expect("valid file");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.random().map(|puzzle| puzzle.id.as_str()), Some("x"));
    }

    #[test]
    fn test_random_on_empty_catalog() {
        assert!(PuzzleCatalog::default().random().is_none());
    }
}
