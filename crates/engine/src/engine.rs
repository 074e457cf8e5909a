//! Analytics engine. Owns the active population and catalog and serves
//! every query against the currently installed model snapshot.

use crate::snapshot::{AssignmentResult, ModelSnapshot};
use crate::store::ModelStore;
use crate::training::{Trainer, TrainingReport};
use liga_clustering::ClusterSummary;
use liga_core::config::AppConfig;
use liga_core::error::{LigaError, LigaResult};
use liga_core::population::Population;
use liga_core::schema::FeatureSchema;
use liga_core::types::{ServiceCatalog, UserRecord};
use liga_features::{EncodedUser, FeatureEncoder, Imputer};
use liga_recommend::{
    ProgressWeek, Recommendation, SimilarUser, SimilarityIndex, UserAdvice, UserInsights,
    UserProfileSummary,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Queries read the snapshot through a cloned `Arc`, so a retrain or load
/// swaps the whole bundle at once and in-flight readers keep the old one.
pub struct AnalyticsEngine {
    population: Population,
    encoded: Vec<EncodedUser>,
    catalog: ServiceCatalog,
    config: AppConfig,
    encoder: FeatureEncoder,
    store: ModelStore,
    snapshot: RwLock<Option<Arc<ModelSnapshot>>>,
}

impl AnalyticsEngine {
    pub fn new(population: Population, catalog: ServiceCatalog, config: AppConfig) -> Self {
        let encoder = FeatureEncoder::new();
        let encoded = encoder.encode_all(population.records());
        let store = ModelStore::new(&config.store.model_path);

        info!(
            users = population.len(),
            services = catalog.services.len(),
            model_path = %config.store.model_path,
            "Analytics engine initialized"
        );

        Self {
            population,
            encoded,
            catalog,
            config,
            encoder,
            store,
            snapshot: RwLock::new(None),
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    // ─── Model lifecycle ────────────────────────────────────────────────────

    /// Train on the active population and install the result.
    pub fn train(&self) -> LigaResult<TrainingReport> {
        let trainer = Trainer::from_config(&self.config.clustering);
        let (snapshot, report) = trainer.train_encoded(&self.population, &self.encoded)?;
        self.install(snapshot)?;
        Ok(report)
    }

    /// Replace the served snapshot.
    pub fn install(&self, snapshot: ModelSnapshot) -> LigaResult<()> {
        snapshot.ensure_compatible(&self.encoder)?;
        let k = snapshot.model().k();
        let trained_at = snapshot.trained_at();
        *self.snapshot.write() = Some(Arc::new(snapshot));
        info!(k = k, trained_at = %trained_at, "Model snapshot installed");
        Ok(())
    }

    pub fn snapshot(&self) -> LigaResult<Arc<ModelSnapshot>> {
        self.current().ok_or_else(|| {
            LigaError::PreconditionNotMet("no trained model is installed".to_string())
        })
    }

    pub fn has_model(&self) -> bool {
        self.snapshot.read().is_some()
    }

    pub fn save_model(&self) -> LigaResult<()> {
        let snapshot = self.snapshot()?;
        self.store.save(&snapshot)
    }

    pub fn load_model(&self) -> LigaResult<()> {
        let snapshot = self.store.load(&self.encoder)?;
        self.install(snapshot)
    }

    fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.snapshot.read().clone()
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn cluster_summaries(&self) -> LigaResult<Vec<ClusterSummary>> {
        Ok(self.snapshot()?.summaries().to_vec())
    }

    /// Assign a record that need not be part of the population.
    pub fn assign_new_user(&self, record: &UserRecord) -> LigaResult<AssignmentResult> {
        self.snapshot()?.assign(&self.encoder, record)
    }

    pub fn assign_user(&self, user_id: &str) -> LigaResult<AssignmentResult> {
        let position = self.population.position(user_id)?;
        self.snapshot()?.assign_encoded(&self.encoded[position])
    }

    /// Top `n` services of the user's own provider. A provider that is not
    /// in the catalog, or offers nothing, yields an empty list.
    pub fn recommend_services(&self, user_id: &str, n: usize) -> LigaResult<Vec<Recommendation>> {
        let position = self.population.position(user_id)?;
        let snapshot = self.snapshot()?;
        let record = &self.population.records()[position];

        let services = self.catalog.services_for_user(record);
        if services.is_empty() {
            debug!(
                user_id = user_id,
                provider = %record.physical.current_insurance_provider,
                "No services offered by the user's provider"
            );
            return Ok(Vec::new());
        }

        snapshot.recommend(&self.encoded[position], &services, n)
    }

    pub fn find_similar_users(&self, user_id: &str, n: usize) -> LigaResult<Vec<SimilarUser>> {
        self.population.position(user_id)?;
        SimilarityIndex::from_users(&self.encoded)?.nearest(user_id, n)
    }

    pub fn user_profile(&self, user_id: &str) -> LigaResult<UserProfileSummary> {
        self.with_insights(user_id, |insights| insights.profile())
    }

    pub fn user_advice(&self, user_id: &str) -> LigaResult<UserAdvice> {
        self.with_insights(user_id, |insights| insights.advice())
    }

    pub fn track_progress(&self, user_id: &str, weeks_back: u32) -> LigaResult<Vec<ProgressWeek>> {
        self.with_insights(user_id, |insights| insights.progress(weeks_back))
    }

    /// Gaps are filled with the installed model's training means, or with
    /// the active population's means when no model is installed.
    fn with_insights<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&UserInsights) -> LigaResult<T>,
    ) -> LigaResult<T> {
        let position = self.population.position(user_id)?;
        let snapshot = self.current();
        let fitted;
        let imputer = match snapshot.as_deref() {
            Some(snapshot) => snapshot.imputer(),
            None => {
                fitted = Imputer::fit(&self.encoded, &FeatureSchema::clustering())?;
                &fitted
            }
        };
        f(&UserInsights::new(
            &self.population.records()[position],
            &self.encoded[position],
            imputer,
        ))
    }
}
