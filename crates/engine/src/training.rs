//! Batch training: records in, immutable snapshot out.

use crate::snapshot::{ModelSnapshot, BUNDLE_FORMAT_VERSION};
use chrono::Utc;
use liga_clustering::{ClusterModel, ClusterSummarizer, KMeansParams};
use liga_core::config::ClusteringConfig;
use liga_core::error::LigaResult;
use liga_core::population::Population;
use liga_core::schema::FeatureSchema;
use liga_features::{EncodedUser, FeatureEncoder, Imputer, Standardizer};
use liga_recommend::RecommendationRuleEngine;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub population_size: usize,
    pub k: usize,
    pub seed: u64,
    pub inertia: f64,
    pub silhouette: f64,
    pub iterations: usize,
    pub inertia_history: Vec<f64>,
    pub cluster_sizes: Vec<usize>,
    /// Category values that fell back to a default code.
    pub encoding_fallbacks: usize,
}

pub struct Trainer {
    params: KMeansParams,
    encoder: FeatureEncoder,
}

impl Trainer {
    pub fn new(params: KMeansParams) -> Self {
        Self {
            params,
            encoder: FeatureEncoder::new(),
        }
    }

    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(KMeansParams {
            k: config.n_clusters,
            n_init: config.n_init,
            max_iter: config.max_iter,
            seed: config.seed,
        })
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    pub fn train(&self, population: &Population) -> LigaResult<(ModelSnapshot, TrainingReport)> {
        let encoded = self.encoder.encode_all(population.records());
        self.train_encoded(population, &encoded)
    }

    /// Train on a population whose records were already encoded, aligned by
    /// position.
    pub fn train_encoded(
        &self,
        population: &Population,
        encoded: &[EncodedUser],
    ) -> LigaResult<(ModelSnapshot, TrainingReport)> {
        let schema = FeatureSchema::clustering();
        let imputer = Imputer::fit(encoded, &schema)?;
        let raw = imputer.matrix(encoded)?;
        let standardizer = Standardizer::fit(&raw)?;
        let standardized = standardizer.transform_matrix(&raw)?;

        let outcome = ClusterModel::fit(&standardized, &self.params)?;
        let k = outcome.model.k();
        let summaries = ClusterSummarizer::summarize(population.records(), encoded, &outcome.labels, k)?;
        let rules = RecommendationRuleEngine::derive_all(&summaries);

        let report = TrainingReport {
            population_size: population.len(),
            k,
            seed: self.params.seed,
            inertia: outcome.model.inertia(),
            silhouette: outcome.model.silhouette(),
            iterations: outcome.model.n_iter(),
            inertia_history: outcome.inertia_history,
            cluster_sizes: summaries.iter().map(|s| s.size).collect(),
            encoding_fallbacks: encoded.iter().map(|e| e.fallbacks.len()).sum(),
        };

        info!(
            population = report.population_size,
            k = report.k,
            inertia = report.inertia,
            silhouette = report.silhouette,
            fallbacks = report.encoding_fallbacks,
            "Training complete"
        );

        let snapshot = ModelSnapshot {
            format_version: BUNDLE_FORMAT_VERSION,
            schema,
            encoding: self.encoder.fingerprint(),
            imputer,
            standardizer,
            model: outcome.model,
            summaries,
            rules,
            trained_at: Utc::now(),
            population_size: population.len(),
        };
        Ok((snapshot, report))
    }
}
