use anyhow::{Context, Result};
use nashlab_game::PayoffMatrix;
use std::fs;
use std::path::Path;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Read a `{"players": [...], "payoffs": [...]}` game definition.
pub fn load_game_file(path: &Path) -> Result<PayoffMatrix> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read game file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid game definition in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_empty_tokens() {
        assert_eq!(split_csv(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn load_game_file_reports_path_on_failure() {
        let path = std::env::temp_dir().join("nashlab-missing-game.json");
        let err = load_game_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("nashlab-missing-game.json"));
    }
}
