//! Nearest-user lookup by cosine similarity over the similarity features.

use liga_core::error::{LigaError, LigaResult};
use liga_core::schema::FeatureSchema;
use liga_features::{EncodedUser, Imputer, Standardizer};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarUser {
    pub user_id: String,
    pub similarity: f64,
}

/// Full pairwise similarity matrix over one population. Built on demand and
/// discarded after the query.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    user_ids: Vec<String>,
    similarities: Array2<f64>,
}

impl SimilarityIndex {
    /// Impute, standardize and index `users` over
    /// [`FeatureSchema::similarity`].
    pub fn from_users(users: &[EncodedUser]) -> LigaResult<Self> {
        let imputer = Imputer::fit(users, &FeatureSchema::similarity())?;
        let raw = imputer.matrix(users)?;
        let standardized = Standardizer::fit(&raw)?.transform_matrix(&raw)?;
        Self::build(users.iter().map(|u| u.user_id.clone()).collect(), &standardized)
    }

    /// Index already-standardized rows, one per entry of `user_ids`.
    pub fn build(user_ids: Vec<String>, vectors: &Array2<f64>) -> LigaResult<Self> {
        if user_ids.len() != vectors.nrows() {
            return Err(LigaError::InvalidInput(format!(
                "{} user ids for {} vectors",
                user_ids.len(),
                vectors.nrows()
            )));
        }

        let mut unit = vectors.to_owned();
        for mut row in unit.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|x| x / norm);
            }
        }
        let similarities = unit.dot(&unit.t());

        debug!(users = user_ids.len(), "Similarity matrix built");
        Ok(Self {
            user_ids,
            similarities,
        })
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub fn similarity(&self, a: usize, b: usize) -> Option<f64> {
        self.similarities.get((a, b)).copied()
    }

    /// The `n` users most similar to `user_id`, excluding the user. Equal
    /// similarities keep population order.
    pub fn nearest(&self, user_id: &str, n: usize) -> LigaResult<Vec<SimilarUser>> {
        let query = self
            .user_ids
            .iter()
            .position(|id| id == user_id)
            .ok_or_else(|| LigaError::NotFound(user_id.to_string()))?;

        let mut candidates: Vec<(usize, f64)> = self
            .similarities
            .row(query)
            .iter()
            .copied()
            .enumerate()
            .filter(|&(i, _)| i != query)
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        candidates.truncate(n);

        Ok(candidates
            .into_iter()
            .map(|(i, similarity)| SimilarUser {
                user_id: self.user_ids[i].clone(),
                similarity,
            })
            .collect())
    }
}

/// Cosine of the angle between `a` and `b`; 0 when either has zero length.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}
