//! Chitanka corpus main entry point
//!
//! This is the command-line interface for the corpus crawler and analyzer.

use anyhow::Context;
use chitanka_corpus::analyzer::run_analysis;
use chitanka_corpus::config::{load_config_or_default, Config};
use chitanka_corpus::crawler::run_crawl;
use chitanka_corpus::output::{load_statistics, print_author, print_statistics};
use chitanka_corpus::storage::{SqliteStorage, TextStore};
use chitanka_corpus::CorpusError;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Chitanka corpus: a polite text harvester and corpus analyzer
///
/// Walks the catalog's keyword search, downloads new texts and author
/// metadata into a local corpus, and computes vocabulary and sentence
/// statistics per text and per author.
#[derive(Parser, Debug)]
#[command(name = "chitanka-corpus")]
#[command(version = "1.0.0")]
#[command(about = "A polite text harvester and corpus analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download new texts until the quota is reached
    Crawl {
        /// Number of new texts to download
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Compute statistics for texts and authors not analyzed today
    Analyze,

    /// Crawl, then analyze
    Import {
        /// Number of new texts to download
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Show corpus statistics from the database
    Stats {
        /// Number of authors to rank
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Show one author's record and statistics
    Author {
        /// Catalog author ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    match cli.command {
        Command::Crawl { count } => handle_crawl(config, count).await,
        Command::Analyze => handle_analyze(&config),
        Command::Import { count } => {
            handle_crawl(config.clone(), count).await?;
            handle_analyze(&config)
        }
        Command::Stats { top } => handle_stats(&config, top),
        Command::Author { id } => handle_author(&config, id),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("chitanka_corpus=info,warn"),
            1 => EnvFilter::new("chitanka_corpus=debug,info"),
            2 => EnvFilter::new("chitanka_corpus=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Sends `true` on the returned channel when Ctrl-C is pressed
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current text");
            let _ = tx.send(true);
        }
    });
    rx
}

/// Handles the crawl operation
async fn handle_crawl(config: Config, count: Option<usize>) -> anyhow::Result<()> {
    let quota = count.unwrap_or(config.crawler.default_quota);
    tracing::info!(
        "Crawling {} into {} (database {})",
        config.catalog.base_url,
        config.output.data_dir.display(),
        config.output.database_path
    );

    let report = run_crawl(config, quota, Some(shutdown_on_ctrl_c()))
        .await
        .context("Crawl failed")?;

    println!(
        "Saved {} new texts ({} keys searched, {} already known, {} failed)",
        report.saved, report.keys_searched, report.skipped_known, report.failed
    );
    if report.interrupted {
        println!("Crawl was interrupted");
    }

    Ok(())
}

/// Handles the analysis operation
fn handle_analyze(config: &Config) -> anyhow::Result<()> {
    let report = run_analysis(config).context("Analysis failed")?;

    println!(
        "Analyzed {} texts and {} unknown-author texts; updated {} of {} authors",
        report.texts_analyzed,
        report.unknown_texts_analyzed,
        report.authors_updated,
        report.authors_considered
    );
    if report.texts_missing + report.texts_unreadable > 0 {
        println!(
            "Skipped {} missing and {} unreadable files",
            report.texts_missing, report.texts_unreadable
        );
    }

    Ok(())
}

/// Handles the stats operation: shows statistics from the database
fn handle_stats(config: &Config, top: usize) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, top)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the author operation
fn handle_author(config: &Config, id: i64) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let author = storage
        .get_author(id)?
        .ok_or(CorpusError::AuthorNotFound(id))?;
    print_author(&author);

    Ok(())
}
