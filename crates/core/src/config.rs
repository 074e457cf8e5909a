use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `BEWEGUNGSLIGA__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityConfig {
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_weeks_back")]
    pub weeks_back: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

// Default functions
fn default_n_clusters() -> usize {
    5
}
fn default_n_init() -> usize {
    10
}
fn default_max_iter() -> usize {
    300
}
fn default_seed() -> u64 {
    42
}
fn default_top_n() -> usize {
    2
}
fn default_neighbors() -> usize {
    5
}
fn default_weeks_back() -> u32 {
    4
}
fn default_model_path() -> String {
    "models/cluster_model.json".to_string()
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: default_n_clusters(),
            n_init: default_n_init(),
            max_iter: default_max_iter(),
            seed: default_seed(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            neighbors: default_neighbors(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            weeks_back: default_weeks_back(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            recommendation: RecommendationConfig::default(),
            similarity: SimilarityConfig::default(),
            progress: ProgressConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("BEWEGUNGSLIGA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
