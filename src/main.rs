//! Sumi-Frontier main entry point
//!
//! This is the command-line interface for exercising a crawl frontier from a
//! settings file: hosts are whitelisted, seeds submitted and the resulting
//! dispatch order printed.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_frontier::config::{load_config_with_hash, Config};
use sumi_frontier::output::print_statistics;
use sumi_frontier::Frontier;
use tracing_subscriber::EnvFilter;

/// Sumi-Frontier: the crawl frontier of the Sumi indexing platform
///
/// Loads a frontier settings file, whitelists its hosts, submits its seed
/// URLs and prints the order in which a fetch engine would receive them.
#[derive(Parser, Debug)]
#[command(name = "sumi-frontier")]
#[command(version = "1.0.0")]
#[command(about = "A two-tier crawl frontier", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be seeded without starting the frontier
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_run(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_frontier=info,warn"),
            1 => EnvFilter::new("sumi_frontier=debug,info"),
            2 => EnvFilter::new("sumi_frontier=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Frontier Dry Run ===\n");

    println!("Frontier Configuration:");
    println!("  Priority capacity: {}", config.frontier.priority_capacity);
    println!("  Overflow capacity: {}", config.frontier.overflow_capacity);
    println!("  Host capacity: {}", config.frontier.host_capacity);
    println!("  Local files: {}", config.frontier.local_files);

    if !config.frontier.local_seeds.is_empty() {
        println!("\nLocal Seeds ({}):", config.frontier.local_seeds.len());
        for seed in &config.frontier.local_seeds {
            println!("  * {}", seed);
        }
    }

    println!("\nWhitelisted Hosts ({}):", config.whitelist.len());
    for entry in &config.whitelist {
        println!(
            "  - {} ({} seeds, {} exclusions)",
            entry.host,
            entry.seeds.len(),
            entry.exclude.len()
        );
        for seed in &entry.seeds {
            println!("    * {}", seed);
        }
        for pattern in &entry.exclude {
            println!("    ! {}", pattern);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would seed the frontier with {} URLs", config.seed_count());
}

/// Seeds a frontier and drains it in dispatch order
async fn handle_run(config: &Config) -> Result<()> {
    let frontier = Arc::new(Frontier::from_config(config).context("Failed to start frontier")?);

    let mut stored = 0;
    for (seed, admission) in frontier.seed(config) {
        tracing::info!("Seed {} -> {:?}", seed, admission);
        if admission.is_stored() {
            stored += 1;
        }
    }

    println!("=== Dispatch Order ===\n");
    for position in 1..=stored {
        match frontier.get_link_async().await {
            Some(link) => println!("{:>4}. {}", position, link),
            None => break,
        }
    }
    println!();

    print_statistics(&frontier.statistics());
    frontier.destroy();

    Ok(())
}
