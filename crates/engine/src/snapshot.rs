//! The trained bundle served to every query. Immutable once built.

use chrono::{DateTime, Utc};
use liga_clustering::{ClusterModel, ClusterSummary};
use liga_core::error::{LigaError, LigaResult};
use liga_core::schema::FeatureSchema;
use liga_core::types::{ServiceCatalogEntry, UserRecord};
use liga_features::{EncodedUser, FeatureEncoder, Imputer, Standardizer};
use liga_recommend::{Recommendation, RuleSet, ServiceRelevanceScorer, UserTraits};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Bundle layout version written by this build.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSnapshot {
    pub(crate) format_version: u32,
    pub(crate) schema: FeatureSchema,
    /// Fingerprint of the encoding tables the model was trained with.
    pub(crate) encoding: String,
    pub(crate) imputer: Imputer,
    pub(crate) standardizer: Standardizer,
    pub(crate) model: ClusterModel,
    pub(crate) summaries: Vec<ClusterSummary>,
    pub(crate) rules: RuleSet,
    pub(crate) trained_at: DateTime<Utc>,
    pub(crate) population_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentResult {
    pub predicted_cluster: usize,
    pub cluster_description: String,
    pub cluster_size: usize,
    pub confidence: f64,
    pub distances: Vec<f64>,
}

impl ModelSnapshot {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn imputer(&self) -> &Imputer {
        &self.imputer
    }

    pub fn standardizer(&self) -> &Standardizer {
        &self.standardizer
    }

    pub fn model(&self) -> &ClusterModel {
        &self.model
    }

    pub fn summaries(&self) -> &[ClusterSummary] {
        &self.summaries
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Structural checks that every component agrees on width and cluster
    /// count. Returns the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(format!(
                "unsupported bundle format {} (expected {BUNDLE_FORMAT_VERSION})",
                self.format_version
            ));
        }
        let width = self.schema.len();
        if self.imputer.schema() != &self.schema {
            return Err("imputer schema differs from bundle schema".to_string());
        }
        if self.imputer.means().len() != width {
            return Err(format!(
                "imputer holds {} means for {width} features",
                self.imputer.means().len()
            ));
        }
        if self.standardizer.width() != width || self.standardizer.stds().len() != width {
            return Err(format!(
                "standardizer width {} does not match {width} features",
                self.standardizer.width()
            ));
        }
        if self.model.dim() != width {
            return Err(format!(
                "centroids have {} columns for {width} features",
                self.model.dim()
            ));
        }
        let k = self.model.k();
        if k == 0 {
            return Err("model has no centroids".to_string());
        }
        if self.summaries.len() != k {
            return Err(format!("{} summaries for {k} clusters", self.summaries.len()));
        }
        if self.rules.len() != k {
            return Err(format!("{} rules for {k} clusters", self.rules.len()));
        }
        if (0..k).any(|c| self.rules.for_cluster(c).is_none() || self.summaries[c].cluster_id != c) {
            return Err("summaries or rules are not indexed by cluster id".to_string());
        }
        Ok(())
    }

    /// Fails with `SchemaMismatch` unless this snapshot was built with the
    /// current feature schema and encoding tables.
    pub fn ensure_compatible(&self, encoder: &FeatureEncoder) -> LigaResult<()> {
        FeatureSchema::clustering().ensure_compatible(&self.schema)?;
        if self.encoding != encoder.fingerprint() {
            return Err(LigaError::SchemaMismatch(
                "encoding tables differ from those the model was trained with".to_string(),
            ));
        }
        Ok(())
    }

    /// Impute and standardize with the training statistics.
    pub fn vectorize(&self, user: &EncodedUser) -> LigaResult<Array1<f64>> {
        let raw = self.imputer.row(user)?;
        self.standardizer.transform(raw.view())
    }

    pub fn assign_vector(&self, vector: ArrayView1<f64>) -> LigaResult<AssignmentResult> {
        let assignment = self.model.predict(vector)?;
        let summary = self.summaries.get(assignment.cluster).ok_or_else(|| {
            LigaError::PreconditionNotMet(format!(
                "no summary for cluster {}",
                assignment.cluster
            ))
        })?;
        Ok(AssignmentResult {
            predicted_cluster: assignment.cluster,
            cluster_description: summary.description.clone(),
            cluster_size: summary.size,
            confidence: assignment.confidence,
            distances: assignment.distances,
        })
    }

    pub fn assign_encoded(&self, user: &EncodedUser) -> LigaResult<AssignmentResult> {
        self.assign_vector(self.vectorize(user)?.view())
    }

    pub fn assign(&self, encoder: &FeatureEncoder, record: &UserRecord) -> LigaResult<AssignmentResult> {
        self.assign_encoded(&encoder.encode(record))
    }

    /// Rank `services` for an already-encoded user with the rules of the
    /// cluster the user is assigned to.
    pub fn recommend(
        &self,
        user: &EncodedUser,
        services: &[&ServiceCatalogEntry],
        n: usize,
    ) -> LigaResult<Vec<Recommendation>> {
        let assignment = self.assign_encoded(user)?;
        let rule = self.rules.for_cluster(assignment.predicted_cluster).ok_or_else(|| {
            LigaError::PreconditionNotMet(format!(
                "no rule for cluster {}",
                assignment.predicted_cluster
            ))
        })?;
        let traits = UserTraits::from_encoded(user, &self.imputer)?;
        Ok(ServiceRelevanceScorer::new(rule).rank(&traits, services, n))
    }
}
