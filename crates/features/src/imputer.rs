//! Mean imputation of missing numeric features.

use crate::encoder::EncodedUser;
use liga_core::error::{LigaError, LigaResult};
use liga_core::schema::{Feature, FeatureSchema};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-column population means, in schema order, used to fill gaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Imputer {
    schema: FeatureSchema,
    means: Vec<f64>,
}

impl Imputer {
    /// Fit column means over the values present in `users`. A column with no
    /// value anywhere in the population cannot be reconstructed.
    pub fn fit(users: &[EncodedUser], schema: &FeatureSchema) -> LigaResult<Self> {
        if users.is_empty() {
            return Err(LigaError::PreconditionNotMet(
                "cannot fit imputer on an empty population".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(schema.len());
        for &feature in &schema.features {
            let (sum, count) = users
                .iter()
                .filter_map(|u| u.value(feature))
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            if count == 0 {
                return Err(LigaError::SchemaMismatch(format!(
                    "feature {feature} has no recorded value in the population"
                )));
            }
            if count < users.len() {
                debug!(
                    feature = feature.name(),
                    missing = users.len() - count,
                    "Imputing missing values with population mean"
                );
            }
            means.push(sum / count as f64);
        }

        Ok(Self {
            schema: schema.clone(),
            means,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Population mean of `feature`, if it is part of this imputer's schema.
    pub fn mean_of(&self, feature: Feature) -> Option<f64> {
        self.schema.position(feature).and_then(|i| self.means.get(i).copied())
    }

    /// The user's value for `feature`, falling back to the population mean.
    pub fn value_of(&self, user: &EncodedUser, feature: Feature) -> Option<f64> {
        user.value(feature).or_else(|| self.mean_of(feature))
    }

    /// Dense feature row in schema order.
    pub fn row(&self, user: &EncodedUser) -> LigaResult<Array1<f64>> {
        if self.means.len() != self.schema.len() {
            return Err(LigaError::SchemaMismatch(format!(
                "imputer holds {} means for {} features",
                self.means.len(),
                self.schema.len()
            )));
        }
        Ok(self
            .schema
            .features
            .iter()
            .zip(self.means.iter())
            .map(|(&feature, &mean)| user.value(feature).unwrap_or(mean))
            .collect())
    }

    pub fn matrix(&self, users: &[EncodedUser]) -> LigaResult<Array2<f64>> {
        let mut matrix = Array2::<f64>::zeros((users.len(), self.schema.len()));
        for (i, user) in users.iter().enumerate() {
            matrix.row_mut(i).assign(&self.row(user)?);
        }
        Ok(matrix)
    }
}
