//! `pairwise`: generate pairwise covering test suites from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::info;
use serde_json::json;

use pairwise_core::generate::{generate_async, GenerateRequest, Generation, Strategy, Verdict};
use pairwise_core::limits::{check_candidate_space, SolveLimits};
use pairwise_core::rpc;
use pairwise_explore::solver::build_pairs;
use pairwise_ir::validate::validate_parameter_set;
use pairwise_ir::{parse_parameters, ParameterSet};

/// Display settings sample used when no parameters file is given.
const DEMO_PARAMETERS: &str = include_str!("../demo/parameters.json");

/// Exit status when generation finishes without a covering suite.
const EXIT_NO_SUITE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "pairwise", version, about = "Pairwise (2-way) covering test suite generator")]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Parameters file: a JSON object mapping each name to its list of values.
    /// Defaults to the built-in display settings demo.
    #[arg(short, long, value_name = "FILE")]
    params: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct LimitArgs {
    /// JSON file with solve limits (time_budget_secs, workers, max_candidates)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Wall-clock seconds for the exact solver
    #[arg(long, value_name = "SECS")]
    time_budget: Option<u64>,

    /// Scoring threads
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Largest Cartesian product to enumerate
    #[arg(long, value_name = "N")]
    max_candidates: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a covering suite and print it as a table
    Generate {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        limits: LimitArgs,

        /// exact (minimal, time-bounded) or greedy (fast)
        #[arg(short, long, default_value_t = Strategy::Exact)]
        strategy: Strategy,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every pair a covering suite must contain
    Pairs {
        #[command(flatten)]
        input: InputArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a parameters file against the editing rules
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Answer line-delimited JSON-RPC requests on stdin
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => simplelog::LevelFilter::Error,
        (false, 0) => simplelog::LevelFilter::Warn,
        (false, 1) => simplelog::LevelFilter::Info,
        (false, _) => simplelog::LevelFilter::Debug,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    match cli.command {
        Command::Generate {
            input,
            limits,
            strategy,
            json,
        } => run_generate(&input, &limits, strategy, json).await,
        Command::Pairs { input, json } => run_pairs(&input, json),
        Command::Validate { input } => run_validate(&input),
        Command::Serve => {
            info!("serving JSON-RPC on stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            rpc::serve(stdin, tokio::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_generate(
    input: &InputArgs,
    limit_args: &LimitArgs,
    strategy: Strategy,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let parameters = load_parameters(input.params.as_deref())?;
    if let Err(code) = report_validation(&parameters) {
        return Ok(code);
    }
    let limits = load_limits(limit_args)?;

    let request = GenerateRequest {
        parameters,
        strategy,
        limits,
    };
    let generation = generate_async(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&generation)?);
    } else {
        print_generation(&generation);
    }

    Ok(if generation.verdict.is_covering() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NO_SUITE)
    })
}

fn run_pairs(input: &InputArgs, json: bool) -> anyhow::Result<ExitCode> {
    let parameters = load_parameters(input.params.as_deref())?;
    let universe = build_pairs(&parameters)?;
    let pairs: Vec<String> = universe.iter().map(|p| p.to_string()).collect();

    if json {
        let body = json!({ "total_pairs": pairs.len(), "pairs": pairs });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("Total pairs: {}", pairs.len());
        for pair in &pairs {
            println!("{pair}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_validate(input: &InputArgs) -> anyhow::Result<ExitCode> {
    let parameters = load_parameters(input.params.as_deref())?;
    if let Err(code) = report_validation(&parameters) {
        return Ok(code);
    }

    let universe = build_pairs(&parameters)?;
    let candidates = check_candidate_space(&SolveLimits::default(), &parameters);
    println!(
        "OK: {} parameters, {} pairs to cover",
        parameters.len(),
        universe.len()
    );
    match candidates {
        Ok(size) => println!("{size} candidate test cases"),
        Err(e) => println!("warning: {e}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn load_parameters(path: Option<&Path>) -> anyhow::Result<ParameterSet> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading parameters from {}", path.display()))?,
        None => {
            info!("no parameters file given, using the display settings demo");
            DEMO_PARAMETERS.to_string()
        }
    };
    let parameters = parse_parameters(&text).context("parsing parameters")?;
    Ok(parameters)
}

/// Print every validation problem. `Err` carries the exit code to use.
fn report_validation(parameters: &ParameterSet) -> Result<(), ExitCode> {
    match validate_parameter_set(parameters) {
        Ok(()) => Ok(()),
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            Err(ExitCode::FAILURE)
        }
    }
}

fn load_limits(args: &LimitArgs) -> anyhow::Result<SolveLimits> {
    let mut limits = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading limits from {}", path.display()))?;
            serde_json::from_str(&text).context("parsing limits")?
        }
        None => SolveLimits::default(),
    };
    apply_overrides(&mut limits, args);
    Ok(limits)
}

fn apply_overrides(limits: &mut SolveLimits, args: &LimitArgs) {
    if let Some(secs) = args.time_budget {
        limits.time_budget_secs = secs;
    }
    if let Some(workers) = args.workers {
        limits.workers = workers;
    }
    if let Some(max) = args.max_candidates {
        limits.max_candidates = max;
    }
}

fn print_generation(generation: &Generation) {
    let analytics = &generation.analytics;

    println!("Total pairs to cover: {}", analytics.total_pairs);
    println!("Total test cases: {}", analytics.total_test_cases);
    if !generation.suite.is_empty() {
        println!();
        print!(
            "{}",
            render_table(&analytics.table_headers(), &analytics.table_rows())
        );
        println!();
    }

    match generation.verdict {
        Verdict::Optimal | Verdict::Complete => println!("{}", generation.verdict.describe()),
        Verdict::BestEffort | Verdict::NoSolutionFound => {
            println!("warning: {}", generation.verdict.describe())
        }
        Verdict::IncompleteCoverage => {
            println!("warning: {}", generation.verdict.describe());
            for pair in &generation.uncovered {
                println!("  uncovered: {pair}");
            }
        }
    }
    info!("finished in {:.2}s", analytics.elapsed_secs);
}

/// Left-aligned columns separated by two spaces, with a rule under the header.
fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&format!("{}\n", rule.join("  ")));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}
