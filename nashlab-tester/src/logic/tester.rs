use anyhow::{Context, Result};
use colored::Colorize;
use nashlab_game::{
    PayoffMatrix, SimulationConfig, SimulationResult, StrategyChoice, run_simulation,
    run_simulation_parallel,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{ScenarioCtx, TestScenario};
use super::seeds::SeedInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// One seeded simulation of the game under test.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSimulation {
    pub seed: u64,
    pub label: String,
    pub result: SimulationResult,
}

pub struct LogicTester<'a> {
    matrix: &'a PayoffMatrix,
    choices: &'a [StrategyChoice],
    trials: u64,
    verbose: bool,
}

impl<'a> LogicTester<'a> {
    pub const fn new(
        matrix: &'a PayoffMatrix,
        choices: &'a [StrategyChoice],
        trials: u64,
        verbose: bool,
    ) -> Self {
        Self {
            matrix,
            choices,
            trials,
            verbose,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {seed}, trials: {})",
                    scenario.name.bright_white(),
                    self.trials
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let ctx = ScenarioCtx {
                matrix: self.matrix,
                choices: self.choices,
                trials: self.trials,
                seed: iteration_seed,
            };

            match scenario.run(&ctx) {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{iterations} passed ({duration:?})",
                            i + 1
                        );
                    }
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{iterations} failed: {}",
                            i + 1,
                            message.clone().red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): {message}",
                        i + 1
                    ));
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }

    /// Run the full simulation once per seed.
    ///
    /// With `threads` set, chunks run in parallel on a dedicated pool of that
    /// size; otherwise they run sequentially on the calling thread.
    pub fn run_simulations(
        &self,
        seeds: &[SeedInfo],
        threads: Option<usize>,
    ) -> Result<Vec<SeedSimulation>> {
        let pool = threads
            .map(|n| rayon::ThreadPoolBuilder::new().num_threads(n).build())
            .transpose()
            .context("failed to build simulation thread pool")?;

        seeds
            .iter()
            .map(|info| {
                let config =
                    SimulationConfig::new(self.trials, self.choices.to_vec()).with_seed(info.seed);
                let result = match &pool {
                    Some(pool) => pool.install(|| run_simulation_parallel(self.matrix, &config)),
                    None => run_simulation(self.matrix, &config),
                }
                .with_context(|| format!("simulation failed for seed {}", info.label()))?;
                log::info!(
                    "seed {} simulated {} trials",
                    info.label(),
                    result.iterations
                );
                Ok(SeedSimulation {
                    seed: info.seed,
                    label: info.label(),
                    result,
                })
            })
            .collect()
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::find_scenario;
    use nashlab_game::{GameCatalog, MixedStrategy};

    fn uniform_pair() -> Vec<StrategyChoice> {
        vec![StrategyChoice::Mixed(MixedStrategy::uniform(2).unwrap()); 2]
    }

    #[test]
    fn scenario_results_count_iterations_per_seed() {
        let matrix = GameCatalog::default_catalog().game("chicken").unwrap();
        let choices = uniform_pair();
        let tester = LogicTester::new(matrix, &choices, 300, false);
        let scenario = find_scenario("determinism").unwrap();

        let results = tester.run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.iterations_run, 2);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
        }
        assert_eq!(results[1].seed, 2);
    }

    #[test]
    fn simulations_match_with_and_without_a_pool() {
        let matrix = GameCatalog::default_catalog().game("stag_hunt").unwrap();
        let choices = uniform_pair();
        let tester = LogicTester::new(matrix, &choices, 4_000, false);
        let seeds = [SeedInfo::from_numeric(9), SeedInfo::from_token(255, "0xFF")];

        let sequential = tester.run_simulations(&seeds, None).unwrap();
        let pooled = tester.run_simulations(&seeds, Some(2)).unwrap();
        assert_eq!(sequential.len(), 2);
        assert_eq!(sequential[1].label, "255 (0xFF)");
        for (a, b) in sequential.iter().zip(&pooled) {
            assert_eq!(a.result, b.result);
        }
    }

    #[test]
    fn durations_serialize_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Determinism".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.performance_data, vec![Duration::from_millis(12)]);
    }
}
