use anyhow::{Context, Result, bail};
use nashlab_game::{MixedStrategy, PayoffMatrix, StrategyChoice};

/// Parse one choice token per player.
///
/// A token is a strategy index, a strategy name (case-insensitive),
/// `uniform`, or slash-separated probabilities such as `0.3/0.7`. An empty
/// token list means every player mixes uniformly.
pub fn parse_choices(matrix: &PayoffMatrix, tokens: &[String]) -> Result<Vec<StrategyChoice>> {
    if tokens.is_empty() {
        return (0..matrix.player_count())
            .map(|player| uniform(matrix, player))
            .collect();
    }
    if tokens.len() != matrix.player_count() {
        bail!(
            "expected {} choices (one per player), got {}",
            matrix.player_count(),
            tokens.len()
        );
    }
    tokens
        .iter()
        .enumerate()
        .map(|(player, token)| {
            parse_choice(matrix, player, token).with_context(|| {
                format!("invalid choice '{token}' for {}", matrix.player_name(player))
            })
        })
        .collect()
}

fn parse_choice(matrix: &PayoffMatrix, player: usize, token: &str) -> Result<StrategyChoice> {
    let count = matrix.strategy_count(player);
    if token.eq_ignore_ascii_case("uniform") {
        return uniform(matrix, player);
    }
    if token.contains('/') {
        let weights = token
            .split('/')
            .map(|w| w.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .context("probabilities must be numbers")?;
        if weights.len() != count {
            bail!("{} probabilities for {count} strategies", weights.len());
        }
        return Ok(StrategyChoice::Mixed(MixedStrategy::new(weights)?));
    }
    if let Ok(index) = token.parse::<usize>() {
        if index >= count {
            bail!("strategy index {index} out of range ({count} strategies)");
        }
        return Ok(StrategyChoice::Fixed(index));
    }
    matrix.players()[player]
        .strategies
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .map(StrategyChoice::Fixed)
        .with_context(|| format!("no strategy named '{token}'"))
}

fn uniform(matrix: &PayoffMatrix, player: usize) -> Result<StrategyChoice> {
    Ok(StrategyChoice::Mixed(MixedStrategy::uniform(
        matrix.strategy_count(player),
    )?))
}

/// Short human label for a choice, e.g. `Defect` or `0.30/0.70`.
pub fn describe_choice(matrix: &PayoffMatrix, player: usize, choice: &StrategyChoice) -> String {
    match choice {
        StrategyChoice::Fixed(strategy) => matrix.strategy_name(player, *strategy).to_string(),
        StrategyChoice::Mixed(distribution) => distribution
            .probabilities()
            .iter()
            .map(|p| format!("{p:.2}"))
            .collect::<Vec<_>>()
            .join("/"),
    }
}
