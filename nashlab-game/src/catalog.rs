//! Built-in library of classic games.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::CatalogError;
use crate::payoff::PayoffMatrix;

const DEFAULT_GAME_DATA: &str = include_str!("../data/games.json");

/// A named game addressable by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub game: PayoffMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameCatalog {
    #[serde(default)]
    pub games: Vec<CatalogEntry>,
}

impl GameCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_GAME_DATA).unwrap_or_else(|err| {
            log::error!("embedded game catalog is invalid: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<GameCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a game fails
    /// validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.games.iter().find(|entry| entry.key == key)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownGame`] when no game has `key`.
    pub fn game(&self, key: &str) -> Result<&PayoffMatrix, CatalogError> {
        self.get(key)
            .map(|entry| &entry.game)
            .ok_or_else(|| CatalogError::UnknownGame {
                key: key.to_string(),
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.games.iter().map(|entry| entry.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses_every_game() {
        let catalog = GameCatalog::load_from_static();
        let keys: Vec<&str> = catalog.keys().collect();
        assert_eq!(
            keys,
            vec![
                "prisoners_dilemma",
                "battle_of_the_sexes",
                "matching_pennies",
                "stag_hunt",
                "chicken",
                "rock_paper_scissors",
                "public_goods",
                "iterated_elimination",
            ]
        );
        let goods = catalog.game("public_goods").unwrap();
        assert_eq!(goods.player_count(), 3);
        assert_eq!(goods.payoff_of(&[0, 1, 1]).unwrap(), &[-0.5, 0.5, 0.5]);
    }

    #[test]
    fn default_catalog_is_shared() {
        let a = GameCatalog::default_catalog();
        let b = GameCatalog::default_catalog();
        assert!(std::ptr::eq(a, b));
        assert!(a.get("chicken").is_some());
    }

    #[test]
    fn unknown_keys_and_bad_json_are_errors() {
        let catalog = GameCatalog::default_catalog();
        assert!(matches!(
            catalog.game("snowdrift"),
            Err(CatalogError::UnknownGame { .. })
        ));
        let invalid = r#"{"games": [{"key": "bad", "name": "Bad", "game": {
            "players": [{"name": "Solo", "strategies": ["A"]}],
            "payoffs": [[1]]
        }}]}"#;
        assert!(matches!(
            GameCatalog::from_json(invalid),
            Err(CatalogError::Parse(_))
        ));
    }
}
