// predict-cluster: one PDF in, one `<cluster_id>,<confidence>` line out
//
// stdout carries exactly that line on every path, including bad arguments,
// --help and panics inside a parser. Everything else goes to stderr.
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::{self, IsTerminal, Write};
use std::panic;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use doccluster::config::{self, PipelineConfig};
use doccluster::types::InputError;
use doccluster::{Outcome, Pipeline, Stage};

#[derive(Parser, Debug)]
#[command(
    name = "predict-cluster",
    author,
    version,
    about = "Assign a PDF to its nearest document cluster"
)]
struct Args {
    /// PDF document to classify
    pdf_file: Option<PathBuf>,

    /// Directory holding vectorizer.json and kmeans.json
    /// (repeatable, searched in order)
    #[arg(long = "model-dir", value_name = "DIR")]
    model_dirs: Vec<PathBuf>,

    /// TOML file overriding the built-in settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read at most this many leading pages
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Decimal places for the confidence
    #[arg(long, value_name = "N")]
    decimals: Option<usize>,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only report errors on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let parsed = Args::try_parse();
    let (verbose, quiet) = parsed.as_ref().map_or((0, false), |args| (args.verbose, args.quiet));
    init_tracing(verbose, quiet);

    info!(args = ?std::env::args_os().collect::<Vec<_>>(), "predict-cluster started");
    if let Ok(cwd) = std::env::current_dir() {
        info!(cwd = %cwd.display(), "working directory");
    }

    let (outcome, decimals) = match parsed {
        Ok(args) => run(&args),
        Err(e) => {
            eprint!("{}", e.render());
            let error = InputError::InvalidArguments(format!("{:?}", e.kind()));
            (Outcome::defaulted(Stage::Start, error.into()), config::CONFIDENCE_DECIMALS)
        }
    };

    if let Err(e) = emit(&outcome, decimals) {
        error!("failed to write result: {e:#}");
    }
    info!(
        stage = %outcome.last_stage,
        defaulted = outcome.is_default(),
        "predict-cluster finished"
    );
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter(verbose, quiet)));
    // A second subscriber or a broken stderr must not cost us the result line
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> (Outcome, usize) {
    let config = match build_config(args) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "unusable configuration");
            return (Outcome::defaulted(Stage::Start, e.into()), config::CONFIDENCE_DECIMALS);
        }
    };

    let pipeline = Pipeline::from_config(config);
    let decimals = pipeline.config().output.decimals;

    // Panic messages go through tracing instead of the default hook
    panic::set_hook(Box::new(|info| error!("panic during prediction: {info}")));
    let outcome = pipeline.run_guarded(args.pdf_file.as_deref());
    (outcome, decimals)
}

fn build_config(args: &Args) -> Result<PipelineConfig, config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if !args.model_dirs.is_empty() {
        config.artifacts.search_dirs = args.model_dirs.clone();
    }
    if let Some(max_pages) = args.max_pages {
        config.extraction.max_pages = max_pages;
    }
    if let Some(decimals) = args.decimals {
        config.output.decimals = decimals;
    }
    config.validate()?;
    Ok(config)
}

fn emit(outcome: &Outcome, decimals: usize) -> Result<()> {
    let line = outcome.result.render(decimals);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").context("writing result to stdout")?;
    stdout.flush().context("flushing stdout")?;
    Ok(())
}
