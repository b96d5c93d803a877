use anyhow::Result;
use colored::Colorize;
use nashlab_game::numbers::usize_to_f64;
use nashlab_game::{GameReport, IndifferenceSolution, PayoffMatrix};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::{ScenarioResult, SeedSimulation};

/// Everything a report renders for one tester run.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport<'a> {
    pub game: &'a str,
    #[serde(skip)]
    pub matrix: &'a PayoffMatrix,
    pub analysis: &'a GameReport,
    pub simulations: &'a [SeedSimulation],
    pub scenarios: &'a [ScenarioResult],
}

impl RunReport<'_> {
    fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed).count()
    }
}

#[must_use]
pub fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    usize_to_f64(passed) / usize_to_f64(total) * 100.0
}

fn mixed_summary(report: &RunReport<'_>) -> Option<String> {
    match report.analysis.mixed_equilibrium.as_ref()? {
        IndifferenceSolution::Interior(eq) => Some(format!(
            "{} plays {} with p={:.4}, {} plays {} with q={:.4}",
            report.matrix.player_name(0),
            report.matrix.strategy_name(0, 0),
            eq.probabilities[0],
            report.matrix.player_name(1),
            report.matrix.strategy_name(1, 0),
            eq.probabilities[1]
        )),
        IndifferenceSolution::NoInteriorSolution(reason) => {
            Some(format!("no interior solution ({reason:?})"))
        }
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &RunReport<'_>,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", format!("♟️  Analysis: {}", report.game).bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let analysis = report.analysis;
    let equilibria: Vec<String> = analysis
        .pure_equilibria
        .iter()
        .map(|eq| eq.label(report.matrix))
        .collect();
    if equilibria.is_empty() {
        writeln!(out, "Pure Nash equilibria: none")?;
    } else {
        writeln!(out, "Pure Nash equilibria: {}", equilibria.join("; ").green())?;
    }
    if let Some(mixed) = mixed_summary(report) {
        writeln!(out, "Mixed equilibrium: {mixed}")?;
    }
    for curve in &analysis.best_response_curves {
        writeln!(
            out,
            "Best-response breakpoints for {}: {:?}",
            report.matrix.player_name(curve.player),
            curve.breakpoints
        )?;
    }
    writeln!(out, "Recommendations:")?;
    for recommendation in &analysis.dominance.recommendations {
        writeln!(out, "  • {recommendation}")?;
    }
    writeln!(out)?;

    writeln!(out, "{}", "🎲 Simulations".bright_magenta().bold())?;
    writeln!(out, "{}", "==============".magenta())?;
    for simulation in report.simulations {
        let result = &simulation.result;
        writeln!(
            out,
            "Seed {}: {} trials, average payoffs {:?}",
            simulation.label, result.iterations, result.expected_payoffs
        )?;
        let mut outcomes: Vec<_> = result.outcomes.iter().collect();
        outcomes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (label, count) in outcomes.into_iter().take(3) {
            writeln!(out, "   {label}: {count}")?;
        }
    }
    writeln!(out)?;

    let total_tests = report.scenarios.len();
    let passed_tests = report.passed();
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;
    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", (total_tests - passed_tests).to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        success_rate(passed_tests, total_tests)
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in report.scenarios {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} {} (seed {})",
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = report.scenarios.iter().min_by_key(|r| r.average_duration);
    let slowest = report.scenarios.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &RunReport<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &RunReport<'_>) -> Result<()> {
    writeln!(out, "# Nashlab Report: {}\n", report.game)?;

    writeln!(out, "## Analysis\n")?;
    let analysis = report.analysis;
    if analysis.pure_equilibria.is_empty() {
        writeln!(out, "- **Pure Nash equilibria**: none")?;
    }
    for eq in &analysis.pure_equilibria {
        writeln!(
            out,
            "- **Pure Nash equilibrium**: {} (payoffs {:?})",
            eq.label(report.matrix),
            eq.payoffs
        )?;
    }
    if let Some(mixed) = mixed_summary(report) {
        writeln!(out, "- **Mixed equilibrium**: {mixed}")?;
    }
    for recommendation in &analysis.dominance.recommendations {
        writeln!(out, "- {recommendation}")?;
    }
    writeln!(out)?;

    writeln!(out, "## Simulations\n")?;
    writeln!(out, "| Seed | Trials | Average payoffs |")?;
    writeln!(out, "|------|--------|-----------------|")?;
    for simulation in report.simulations {
        writeln!(
            out,
            "| {} | {} | {:?} |",
            simulation.label, simulation.result.iterations, simulation.result.expected_payoffs
        )?;
    }
    writeln!(out)?;

    let total_tests = report.scenarios.len();
    let passed_tests = report.passed();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;
    for result in report.scenarios {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {status} {} (seed {})\n", result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
