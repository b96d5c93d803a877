mod logic;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use nashlab_game::{AnalysisEngine, GameCatalog, PayoffMatrix, analyze_game};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    LogicTester, RunReport, ScenarioResult, describe_choice, expand_scenarios, find_scenario,
    list_scenarios, parse_choices, resolve_seed_inputs,
};
use util::{load_game_file, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Machine-readable analysis, simulations and scenario results
    Json,
    /// Markdown document
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "nashlab-tester", version = "0.1.0")]
#[command(
    about = "Analyze normal-form games, run seeded simulations and check engine properties"
)]
struct Args {
    /// Catalog key of the game to analyze
    #[arg(long, default_value = "prisoners_dilemma")]
    game: String,

    /// Load the game from a JSON definition instead of the catalog
    #[arg(long)]
    game_file: Option<PathBuf>,

    /// List the built-in games and exit
    #[arg(long)]
    list_games: bool,

    /// One choice per player (index, name, `uniform` or `p1/p2/...`), comma-separated
    #[arg(long, default_value = "")]
    choices: String,

    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal, 0x-hex or `random`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Simulated trials per run
    #[arg(long, default_value_t = 10_000)]
    trials: u64,

    /// Run simulation chunks on a thread pool of this size
    #[arg(long)]
    threads: Option<usize>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? || maybe_list_games(&args)? {
        return Ok(());
    }

    let chatty = args.report != ReportFormat::Json || args.output.is_some();
    if chatty {
        announce_banner();
    }

    let start_time = Instant::now();
    let (game_label, matrix) = load_game(&args)?;
    let choices = parse_choices(&matrix, &split_csv(&args.choices))?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();

    if chatty {
        println!("Game: {}", game_label.bright_white());
        for (player, choice) in choices.iter().enumerate() {
            println!(
                "  {}: {}",
                matrix.player_name(player),
                describe_choice(&matrix, player, choice)
            );
        }
    }

    let analysis = analyze_game(&matrix);
    let tester = LogicTester::new(&matrix, &choices, args.trials, args.verbose);
    let simulations = tester.run_simulations(&seed_infos, args.threads)?;
    let results = run_scenarios(&args, &tester, &seeds, chatty);

    let report = RunReport {
        game: &game_label,
        matrix: &matrix,
        analysis: &analysis,
        simulations: &simulations,
        scenarios: &results,
    };
    write_reports(&args, &report, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn maybe_list_games(args: &Args) -> Result<bool> {
    if !args.list_games {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available games:")?;
    for entry in &GameCatalog::default_catalog().games {
        let shape: Vec<String> = entry.game.shape().iter().map(ToString::to_string).collect();
        writeln!(
            output_target.writer(),
            "  {:25} - {} ({}) {}",
            entry.key,
            entry.name,
            shape.join("x"),
            entry.description
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎲 Nashlab Tester".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn load_game(args: &Args) -> Result<(String, PayoffMatrix)> {
    if let Some(path) = &args.game_file {
        let matrix = load_game_file(path)?;
        return Ok((path.display().to_string(), matrix));
    }
    let engine = AnalysisEngine::new(GameCatalog::load_from_static());
    let matrix = engine
        .game(&args.game)
        .with_context(|| format!("failed to load game '{}'", args.game))?;
    Ok((args.game.clone(), matrix))
}

fn run_scenarios(
    args: &Args,
    tester: &LogicTester<'_>,
    seeds: &[u64],
    chatty: bool,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    if chatty {
        println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
        println!("{}", "-".repeat(30).yellow());
    }

    for scenario_name in expand_scenarios(&split_csv(&args.scenarios)) {
        if let Some(scenario) = find_scenario(&scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(args: &Args, report: &RunReport<'_>, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(&mut output_target, report)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, report)?;
        }
        ReportFormat::Console => {
            logic::reports::generate_console_report(
                &mut output_target,
                report,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
