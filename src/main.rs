//! Main entry point for the league fixturer
//!
//! Loads a league file, folds each division's results into its ratings and
//! writes the fixture table for the requested round.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use league_fixturer::config::{validate_config, AppConfig};
use league_fixturer::league::{write_division_fixture, write_fixture_csv, LeagueFile, LeaguePlanner};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

/// League Fixturer - Elo-rated round-robin fixture generation
#[derive(Parser)]
#[command(
    name = "fixturer",
    version,
    about = "Generate balanced round fixtures for a rated league",
    long_about = "Fixturer rates every team from the season's results, then pairs teams for the \
                 next round with a maximum-weight matching that favours close games and avoids \
                 rematches. Divisions with an odd number of teams get a double round with a bye."
)]
struct Args {
    /// League data file
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to the league file (TOML or JSON)"
    )]
    league: PathBuf,

    /// Round to fixture
    #[arg(
        short,
        long,
        value_name = "N",
        help = "Round number to fixture (prompted for when omitted)"
    )]
    round: Option<u32>,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Output directory override
    #[arg(long, value_name = "DIR", help = "Directory fixture tables are written to")]
    output_dir: Option<PathBuf>,

    /// Random seed override
    #[arg(long, value_name = "N", help = "Seed for rating perturbation")]
    seed: Option<u64>,

    /// Rematch allowance override
    #[arg(
        long,
        value_name = "N",
        help = "Maximum number of times a pairing may repeat"
    )]
    max_rematches: Option<u32>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Dry run mode (print fixtures instead of writing files)
    #[arg(long, help = "Print fixture tables to stdout instead of writing files")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    // Start with environment-based config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(output_dir) = &args.output_dir {
        config.service.output_dir = output_dir.clone();
    }

    if let Some(seed) = args.seed {
        config.scheduling.seed = Some(seed);
    }

    if let Some(max_rematches) = args.max_rematches {
        config.scheduling.max_allowed_rematches = max_rematches;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Ask for the round number on stdin
fn prompt_round() -> Result<u32> {
    println!("Enter Round Number");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read round number")?;

    line.trim()
        .parse()
        .map_err(|_| anyhow!("Invalid round number: {:?}", line.trim()))
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let round = match args.round {
        Some(round) => round,
        None => prompt_round()?,
    };

    info!("Loading league from: {}", args.league.display());
    let league = LeagueFile::from_path(&args.league)?;
    info!(
        "Season {}: {} division(s), fixturing round {}",
        league.season,
        league.divisions.len(),
        round
    );

    let mut rng = match config.scheduling.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let fixtures = LeaguePlanner::from_app_config(config).plan_league(&league, round, &mut rng)?;

    for fixture in &fixtures {
        if args.dry_run {
            println!("{} Round {}", fixture.division, fixture.round_label);
            write_fixture_csv(io::stdout().lock(), &fixture.rows)?;
            println!();
        } else {
            let path = write_division_fixture(&config.service.output_dir, fixture, &league.season)?;
            info!("Wrote {}", path.display());
        }
    }

    info!("Fixtured {} division(s)", fixtures.len());
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&args, &config) {
        error!("Fixturing failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
