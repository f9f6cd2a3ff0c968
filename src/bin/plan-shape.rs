//! Command line driver running shape checks over captured `EXPLAIN (FORMAT JSON)` output.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{warn, LevelFilter};
use serde::Serialize;

use plan_shape::corpus::{
    compare_batch, comparison_table, describe_violation, discover_documents, evaluate,
    load_manifest, pair_documents, summary_line, verdict_table, violation_table, EvaluatorContext,
    ModeFilter, PolicyMode,
};
use plan_shape::explain::parse_plan_document;
use plan_shape::shape::{CheckName, ShapeCheck, ShapeCheckImpl, Violation};

/// Checks the join shape of query plans.
#[derive(Parser, Debug)]
#[command(name = "plan-shape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed table format
    Table,
    /// JSON format
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a check against one plan document
    Check {
        /// Check to run: bushy-shape, no-intermediate-hash-build or target-not-in-bushy
        #[arg(short, long)]
        check: CheckName,

        /// Relation without statistics, for target-not-in-bushy
        #[arg(short, long)]
        target: Option<String>,

        /// Report every violating node instead of the first one
        #[arg(long)]
        all: bool,

        /// Plan document, or `-` for stdin
        file: PathBuf,
    },

    /// Run a check against every document under the given paths
    Evaluate {
        #[arg(short, long)]
        check: CheckName,

        /// Target relation for documents outside a target directory
        #[arg(short, long)]
        target: Option<String>,

        /// Only evaluate documents captured in this mode (off, on, ...)
        #[arg(short, long)]
        mode: Option<String>,

        /// Plan documents or directories of them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Compare plans captured with the policy off (before) and on (after)
    Compare {
        #[arg(short, long)]
        check: CheckName,

        /// Target relation for pairs without one
        #[arg(short, long)]
        target: Option<String>,

        /// Json manifest listing the pairs
        #[arg(long, conflicts_with = "dir")]
        manifest: Option<PathBuf>,

        /// Corpus directory laid out as <target>/<query>_<off|on>.json
        #[arg(required_unless_present = "manifest")]
        dir: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct CheckReport<'a> {
    document: &'a str,
    check: CheckName,
    matched: bool,
    violations: Vec<Violation>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = run(cli);
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }
    ExitCode::from(exit_status(&result))
}

/// 0 for a clean run, 1 when some document or pair failed, 2 when the command could not run.
fn exit_status(result: &Result<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Returns whether the run succeeded without failures.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Check {
            check,
            target,
            all,
            file,
        } => run_check(check, target.as_deref(), all, &file, cli.format).map(|_| true),
        Commands::Evaluate {
            check,
            target,
            mode,
            paths,
        } => {
            let mode_filter = match mode {
                Some(mode) => ModeFilter::Only(mode.parse::<PolicyMode>().unwrap_or_default()),
                None => ModeFilter::All,
            };
            let context = EvaluatorContext::new(check)
                .with_target(target)
                .with_mode_filter(mode_filter);
            run_evaluate(&context, &paths, cli.format)
        }
        Commands::Compare {
            check,
            target,
            manifest,
            dir,
        } => {
            let context = EvaluatorContext::new(check).with_target(target);
            run_compare(&context, manifest.as_deref(), dir.as_deref(), cli.format)
        }
    }
}

fn run_check(
    check: CheckName,
    target: Option<&str>,
    all: bool,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let check = ShapeCheckImpl::new(check, target)?;
    let (document, text) = if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read plan from stdin")?;
        ("-".to_string(), text)
    } else {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        (file.display().to_string(), text)
    };

    let plan = parse_plan_document(&text).with_context(|| format!("Failed to parse {}", document))?;
    let violations = if all {
        check.collect_violations(plan.root())
    } else {
        check.find_violation(plan.root()).into_iter().collect()
    };

    let report = CheckReport {
        document: &document,
        check: check.name(),
        matched: !violations.is_empty(),
        violations,
    };
    match format {
        OutputFormat::Table => {
            violation_table(&report.violations).printstd();
            let result = if report.matched { "matched" } else { "not matched" };
            println!("{} {}: {}", report.check, report.document, result);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn run_evaluate(context: &EvaluatorContext, paths: &[PathBuf], format: OutputFormat) -> Result<bool> {
    let mut documents = vec![];
    for path in paths {
        documents.extend(
            discover_documents(path)
                .with_context(|| format!("Failed to load documents from {}", path.display()))?,
        );
    }

    let verdicts = evaluate(&documents, context);
    match format {
        OutputFormat::Table => {
            verdict_table(context.check, &verdicts).printstd();
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&verdicts)?),
    }

    for verdict in verdicts.iter().filter(|v| v.outcome.is_failure()) {
        let detail = match (&verdict.violation, &verdict.error) {
            (_, Some(error)) => error.clone(),
            (Some(violation), None) => describe_violation(violation),
            (None, None) => String::new(),
        };
        eprintln!("{} {} {}: {}", verdict.outcome, context.check, verdict.document_id, detail);
    }

    Ok(!verdicts.iter().any(|v| v.outcome.is_failure()))
}

fn run_compare(
    context: &EvaluatorContext,
    manifest: Option<&Path>,
    dir: Option<&Path>,
    format: OutputFormat,
) -> Result<bool> {
    let pairs = match (manifest, dir) {
        (Some(manifest), _) => load_manifest(manifest)
            .with_context(|| format!("Failed to load manifest {}", manifest.display()))?,
        (None, Some(dir)) => pair_documents(
            discover_documents(dir)
                .with_context(|| format!("Failed to load documents from {}", dir.display()))?,
        ),
        (None, None) => anyhow::bail!("either a corpus directory or --manifest is required"),
    };

    let summary = compare_batch(&pairs, context);
    match format {
        OutputFormat::Table => {
            comparison_table(&summary).printstd();
            println!("{}", summary_line(&summary));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    let inconclusive = summary.counts().inconclusive;
    if inconclusive > 0 && inconclusive == summary.comparisons.len() {
        warn!("No before plan showed the checked shape, nothing was proven");
    }
    Ok(!summary.has_failures())
}
