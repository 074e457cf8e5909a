//! BewegungsLiga analytics CLI. Trains the user cluster model on a dataset,
//! persists it, and answers assignment, recommendation, similarity and
//! progress queries.

mod dataset;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dataset::Dataset;
use liga_core::config::AppConfig;
use liga_core::error::{LigaError, StorageError};
use liga_core::types::UserRecord;
use liga_engine::AnalyticsEngine;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "liga-analytics")]
#[command(about = "BewegungsLiga user clustering and service recommendation")]
#[command(version)]
struct Cli {
    /// JSON dataset with users, providers and services
    #[arg(short, long, env = "BEWEGUNGSLIGA_DATASET")]
    dataset: PathBuf,

    /// Optional configuration file (TOML/JSON/YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Model bundle path (overrides config)
    #[arg(long, env = "BEWEGUNGSLIGA__STORE__MODEL_PATH")]
    model_path: Option<String>,

    /// Number of clusters (overrides config)
    #[arg(long, env = "BEWEGUNGSLIGA__CLUSTERING__N_CLUSTERS")]
    clusters: Option<usize>,

    /// Random seed for training (overrides config)
    #[arg(long, env = "BEWEGUNGSLIGA__CLUSTERING__SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the cluster model and save the bundle
    Train {
        /// Do not write the bundle to disk
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },

    /// Show the profile of every cluster
    Clusters,

    /// Assign a user to a cluster
    Assign {
        /// User from the dataset
        #[arg(long, conflicts_with = "record", required_unless_present = "record")]
        user_id: Option<String>,

        /// JSON file holding a single user record not in the dataset
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Recommend services from the user's own insurance provider
    Recommend {
        user_id: String,

        /// Number of services (overrides config)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Find the most similar users
    Similar {
        user_id: String,

        /// Number of users (overrides config)
        #[arg(short = 'n', long)]
        neighbors: Option<usize>,
    },

    /// Show a user's profile, fitness score and advice
    Profile { user_id: String },

    /// Show a user's recent weekly progress
    Progress {
        user_id: String,

        /// Weeks of history (overrides config)
        #[arg(short, long)]
        weeks: Option<u32>,
    },
}

#[derive(Serialize)]
struct ProfileOutput<T: Serialize, A: Serialize> {
    profile: T,
    advice: A,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liga_analytics=info,liga_engine=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(path) = cli.model_path {
        config.store.model_path = path;
    }
    if let Some(k) = cli.clusters {
        config.clustering.n_clusters = k;
    }
    if let Some(seed) = cli.seed {
        config.clustering.seed = seed;
    }

    info!(
        n_clusters = config.clustering.n_clusters,
        seed = config.clustering.seed,
        model_path = %config.store.model_path,
        "Configuration loaded"
    );

    let (population, catalog) = Dataset::load(&cli.dataset)?.into_parts()?;
    let engine = AnalyticsEngine::new(population, catalog, config);

    match cli.command {
        Commands::Train { no_save } => {
            let report = engine.train()?;
            if !no_save {
                engine.save_model()?;
            }
            print_json(&report)
        }
        Commands::Clusters => {
            ensure_model(&engine)?;
            print_json(&engine.cluster_summaries()?)
        }
        Commands::Assign { user_id, record } => {
            ensure_model(&engine)?;
            let result = match (user_id, record) {
                (Some(user_id), _) => engine.assign_user(&user_id)?,
                (None, Some(path)) => engine.assign_new_user(&read_record(&path)?)?,
                (None, None) => anyhow::bail!("either --user-id or --record is required"),
            };
            print_json(&result)
        }
        Commands::Recommend { user_id, top_n } => {
            ensure_model(&engine)?;
            let n = top_n.unwrap_or(engine.config().recommendation.top_n);
            print_json(&engine.recommend_services(&user_id, n)?)
        }
        Commands::Similar { user_id, neighbors } => {
            let n = neighbors.unwrap_or(engine.config().similarity.neighbors);
            print_json(&engine.find_similar_users(&user_id, n)?)
        }
        Commands::Profile { user_id } => {
            load_model_if_present(&engine)?;
            print_json(&ProfileOutput {
                profile: engine.user_profile(&user_id)?,
                advice: engine.user_advice(&user_id)?,
            })
        }
        Commands::Progress { user_id, weeks } => {
            load_model_if_present(&engine)?;
            let weeks = weeks.unwrap_or(engine.config().progress.weeks_back);
            print_json(&engine.track_progress(&user_id, weeks)?)
        }
    }
}

/// Load the saved bundle, training one first when none exists yet.
fn ensure_model(engine: &AnalyticsEngine) -> anyhow::Result<()> {
    if load_model_if_present(engine)? {
        return Ok(());
    }
    info!(
        path = %engine.store().path().display(),
        "No saved model, training a new one"
    );
    engine.train()?;
    engine.save_model()?;
    Ok(())
}

fn load_model_if_present(engine: &AnalyticsEngine) -> anyhow::Result<bool> {
    match engine.load_model() {
        Ok(()) => Ok(true),
        Err(LigaError::Storage(StorageError::Missing { .. })) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn read_record(path: &Path) -> anyhow::Result<UserRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading user record {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing user record {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
