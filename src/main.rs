use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use cluster_ann::clock::FixedClock;
use cluster_ann::config::Config;
use cluster_ann::input;
use cluster_ann::output::terminal;
use cluster_ann::pipeline::batch;
use cluster_ann::scoring::stats::StatsCounter;
use cluster_ann::scoring::{CandidateScorer, ScorerOptions, ScoringAlgorithm, ScoringConfig};

/// cluster-ann: rank candidate tweets by approximate cosine similarity.
///
/// Scores a source embedding (weighted cluster memberships) against a
/// cluster -> top tweets index and prints the best candidates.
#[derive(Parser)]
#[command(name = "cluster-ann", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one source embedding against a candidate pool
    Score {
        /// Candidate pool JSON file
        #[arg(long)]
        pool: PathBuf,

        /// Source embedding JSON file (exactly one source)
        #[arg(long)]
        source: PathBuf,

        #[command(flatten)]
        scoring: ScoringArgs,

        /// Rows to print (terminal output only)
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Score many source embeddings against one candidate pool
    Batch {
        /// Candidate pool JSON file
        #[arg(long)]
        pool: PathBuf,

        /// JSON file holding an array of source embeddings
        #[arg(long)]
        sources: PathBuf,

        #[command(flatten)]
        scoring: ScoringArgs,

        /// Number of sources to score in parallel (default: CLUSTER_ANN_CONCURRENCY or 8)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Rows to print per source (terminal output only)
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Print results as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Show the tweet id window an age range resolves to
    Window {
        #[command(flatten)]
        scoring: ScoringArgs,

        /// Print the window as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Per-run overrides of the environment defaults.
#[derive(Args)]
struct ScoringArgs {
    /// Scoring algorithm: LogCosineSimilarity, CosineSimilarity,
    /// CosineSimilarityNoSourceEmbeddingNormalization or DotProduct
    #[arg(long)]
    algorithm: Option<String>,

    /// Strongest candidates to read per cluster
    #[arg(long)]
    max_top: Option<usize>,

    /// Minimum candidate age in hours
    #[arg(long)]
    min_age: Option<u32>,

    /// Maximum candidate age in hours (175200 or more = no limit)
    #[arg(long)]
    max_age: Option<u32>,

    /// Threads to aggregate clusters on
    #[arg(long)]
    partitions: Option<usize>,

    /// Score as of this RFC 3339 time instead of now
    #[arg(long)]
    at: Option<String>,
}

/// Everything a scoring run needs, after merging flags over env defaults.
struct Resolved {
    config: ScoringConfig,
    partitions: usize,
    now: DateTime<Utc>,
}

impl ScoringArgs {
    fn resolve(&self, defaults: &Config) -> Result<Resolved> {
        let algorithm = match &self.algorithm {
            Some(name) => name
                .parse::<ScoringAlgorithm>()
                .context("Bad --algorithm")?,
            None => defaults.algorithm,
        };
        let config = ScoringConfig::new(
            algorithm,
            self.max_top.unwrap_or(defaults.max_top_tweets_per_cluster),
            self.min_age.unwrap_or(defaults.min_tweet_candidate_age_hours),
            self.max_age.unwrap_or(defaults.max_tweet_candidate_age_hours),
        )
        .context("Invalid scoring configuration")?;

        let now = match &self.at {
            Some(at) => DateTime::parse_from_rfc3339(at)
                .with_context(|| format!("--at is not an RFC 3339 time: {at}"))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };

        Ok(Resolved {
            config,
            partitions: self.partitions.unwrap_or(defaults.partitions).max(1),
            now,
        })
    }
}

impl Resolved {
    fn scorer(&self) -> CandidateScorer<FixedClock> {
        CandidateScorer::new()
            .with_clock(FixedClock(self.now))
            .with_options(ScorerOptions {
                partitions: self.partitions,
            })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cluster_ann=info")),
        )
        .init();

    let cli = Cli::parse();
    let defaults = Config::load()?;

    match cli.command {
        Commands::Score {
            pool,
            source,
            scoring,
            limit,
            json,
        } => {
            let run = scoring.resolve(&defaults)?;
            let pool = input::load_pool(&pool)?;
            let source = input::load_source(&source)?;
            info!(
                clusters = pool.len(),
                entries = pool.entry_count(),
                source = %source.id,
                "Loaded inputs"
            );

            let stats = StatsCounter::new();
            let ranked = run.scorer().score(
                &source.embedding,
                &source.id,
                &run.config,
                &pool,
                &stats,
            );
            info!(
                candidates = stats.snapshot().total,
                returned = ranked.len(),
                "Scoring complete"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                terminal::display_ranked(&source.id, run.config.algorithm(), &ranked, limit, run.now);
            }
        }

        Commands::Batch {
            pool,
            sources,
            scoring,
            concurrency,
            limit,
            json,
        } => {
            let run = scoring.resolve(&defaults)?;
            let pool = input::load_pool(&pool)?;
            let sources = input::load_sources(&sources)?;
            if sources.is_empty() {
                warn!("Source file is empty, nothing to score");
                return Ok(());
            }
            let concurrency = concurrency.unwrap_or(defaults.concurrency).max(1);

            if !json {
                println!(
                    "Scoring {} sources against {} clusters ({} concurrent)...",
                    sources.len(),
                    pool.len(),
                    concurrency
                );
            }

            let stats = Arc::new(StatsCounter::new());
            let results = batch::score_batch(
                Arc::new(run.scorer()),
                Arc::new(pool),
                run.config,
                sources,
                Arc::clone(&stats),
                concurrency,
                !json,
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                terminal::display_batch(
                    &results,
                    run.config.algorithm(),
                    stats.snapshot(),
                    limit,
                    run.now,
                );
            }
        }

        Commands::Window { scoring, json } => {
            let run = scoring.resolve(&defaults)?;
            let window = run.scorer().window(&run.config);
            if json {
                println!("{}", serde_json::to_string_pretty(&window)?);
            } else {
                terminal::display_window(&window, &run.config, run.now);
            }
        }
    }

    Ok(())
}
