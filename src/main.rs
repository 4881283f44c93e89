use clap::{Parser, Subcommand};
use playmate_match::config::{LoggingSettings, Settings};
use playmate_match::models::RankedMatch;
use playmate_match::{MatchEngine, PoolData, PoolLoader, RankQuery, RankingReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::Validate;

#[derive(Parser)]
#[command(name = "playmate-match")]
#[command(about = "Rank game partners from a local profile pool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to config/default.toml + config/local.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory holding profiles.json, games.json, mbti.json, zodiac.json
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the pool for one user and print a JSON report
    Rank {
        /// Target user id
        user_id: String,

        /// Maximum results
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Only score candidates sharing a played or recommended game
        #[arg(long)]
        prefilter: bool,
    },

    /// Score one pair and print the per-dimension breakdown
    Score {
        /// Source user id
        source: String,

        /// Target user id
        target: String,
    },
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.data_dir.clone() {
        settings.data.dir = dir;
    }

    init_logging(&settings.logging);
    info!("Starting playmate-match...");

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let data = PoolLoader::new(settings.data.clone()).load()?;
    let engine = build_engine(settings, &data)?;

    match command {
        Commands::Rank {
            user_id,
            top_n,
            prefilter,
        } => {
            let base = settings.rank_options();
            let mut query = RankQuery::new(user_id, top_n.unwrap_or(base.top_n));
            if prefilter {
                query.prefilter = Some(true);
            }
            query.validate()?;

            let outcome =
                engine.find_matches_by_id(&query.user_id, &data.profiles, &query.options(&base))?;
            info!(
                "Ranked {} of {} candidates for {}",
                outcome.matches.len(),
                outcome.total_candidates,
                query.user_id
            );

            let report = RankingReport::new(&query.user_id, &outcome, chrono::Utc::now());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Score { source, target } => {
            let find = |id: &str| {
                data.profiles
                    .iter()
                    .find(|p| p.user_id() == id)
                    .ok_or_else(|| playmate_match::EngineError::TargetNotFound(id.to_string()))
            };
            let result = engine.score_pair(find(&source)?, find(&target)?);
            println!("{}", serde_json::to_string_pretty(&RankedMatch::from((0, &result)))?);
        }
    }

    Ok(())
}

fn build_engine(
    settings: &Settings,
    data: &PoolData,
) -> Result<MatchEngine, Box<dyn std::error::Error>> {
    let mut tables = settings.engine.tables()?;
    data.apply_tables(&mut tables);

    let unknown = data.report_unknown_values(&tables);
    if unknown > 0 {
        info!("{} categorical values fall outside the configured domains", unknown);
    }

    let engine = MatchEngine::new(tables, data.catalog.clone())?;
    info!(
        "Engine initialized with {} active dimensions",
        engine.aggregator().active_dimensions().len()
    );

    Ok(engine)
}
