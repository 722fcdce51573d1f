//! Skein CLI — batch influence analysis over a scraped forum corpus.
//!
//! Usage:
//!   skein --topics <dir> [--proposals file] [--upgrades file]
//!         [--papers file] [--output analysis.json] [--date YYYY-MM-DD]

use chrono::NaiveDate;
use clap::Parser;
use skein::corpus::{load_corpus_dir, load_papers, load_proposals, load_upgrades};
use skein::{AnalysisConfig, Pipeline, UpgradeTimeline};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skein",
    version,
    about = "Influence scoring and thread classification for forum corpora"
)]
struct Cli {
    /// Directory of scraped topic JSON files
    #[arg(long)]
    topics: PathBuf,

    /// Standards-catalog JSON file
    #[arg(long)]
    proposals: Option<PathBuf>,

    /// Upgrade timeline JSON file (builtin timeline if omitted)
    #[arg(long)]
    upgrades: Option<PathBuf>,

    /// Paper catalog JSON file
    #[arg(long)]
    papers: Option<PathBuf>,

    /// Output report path
    #[arg(long, default_value = "analysis.json")]
    output: PathBuf,

    /// Pin the analysis date for reproducible runs (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn run(cli: Cli) -> Result<(), String> {
    let corpus = load_corpus_dir(&cli.topics)
        .map_err(|e| format!("failed to load topics from '{}': {}", cli.topics.display(), e))?;

    let catalog = match &cli.proposals {
        Some(path) => load_proposals(path)
            .map_err(|e| format!("failed to load proposals from '{}': {}", path.display(), e))?,
        None => Default::default(),
    };
    let upgrades = match &cli.upgrades {
        Some(path) => load_upgrades(path)
            .map_err(|e| format!("failed to load upgrades from '{}': {}", path.display(), e))?,
        None => UpgradeTimeline::builtin(),
    };
    let papers = match &cli.papers {
        Some(path) => load_papers(path)
            .map_err(|e| format!("failed to load papers from '{}': {}", path.display(), e))?,
        None => Vec::new(),
    };

    let mut config = AnalysisConfig::new();
    if let Some(date) = cli.date {
        config = config.with_today(date);
    }
    let pipeline = Pipeline::new(config).map_err(|e| e.to_string())?;
    let report = pipeline.run(&corpus, &catalog, &upgrades, &papers);

    let file = File::create(&cli.output)
        .map_err(|e| format!("failed to create '{}': {}", cli.output.display(), e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .map_err(|e| format!("failed to write report: {}", e))?;

    println!(
        "Analyzed {} topics ({} included, {} edges) -> {}",
        report.metadata.total_topics,
        report.metadata.included_topics,
        report.metadata.total_edges,
        cli.output.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
