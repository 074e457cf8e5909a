//! Per-column z-score standardization with statistics frozen at fit time.

use liga_core::error::{LigaError, LigaResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Fitted column means and population standard deviations.
///
/// Serving always transforms with the training statistics; a standardizer is
/// never refit on a single request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Standardizer {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Standardizer {
    /// Fit on a population matrix (rows = users, columns = features).
    pub fn fit(population: &Array2<f64>) -> LigaResult<Self> {
        let n = population.nrows();
        if n == 0 {
            return Err(LigaError::PreconditionNotMet(
                "cannot fit standardizer on an empty population".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(population.ncols());
        let mut stds = Vec::with_capacity(population.ncols());
        for column in population.axis_iter(Axis(1)) {
            let mean = column.sum() / n as f64;
            let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
            means.push(mean);
            stds.push(variance.sqrt());
        }

        Ok(Self { means, stds })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    /// `(x - mean) / std` per column; a zero-variance column maps to 0.
    pub fn transform(&self, vector: ArrayView1<f64>) -> LigaResult<Array1<f64>> {
        self.check_width(vector.len())?;
        Ok(vector
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(&x, (&mean, &std))| if std == 0.0 { 0.0 } else { (x - mean) / std })
            .collect())
    }

    pub fn transform_matrix(&self, matrix: &Array2<f64>) -> LigaResult<Array2<f64>> {
        self.check_width(matrix.ncols())?;
        let mut out = Array2::<f64>::zeros(matrix.raw_dim());
        for (i, row) in matrix.axis_iter(Axis(0)).enumerate() {
            out.row_mut(i).assign(&self.transform(row)?);
        }
        Ok(out)
    }

    /// Undo [`Standardizer::transform`]. Zero-variance columns come back as
    /// the column mean, which is the only value they ever held.
    pub fn inverse_transform(&self, vector: ArrayView1<f64>) -> LigaResult<Array1<f64>> {
        self.check_width(vector.len())?;
        Ok(vector
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(&z, (&mean, &std))| z * std + mean)
            .collect())
    }

    fn check_width(&self, width: usize) -> LigaResult<()> {
        if width != self.means.len() {
            return Err(LigaError::SchemaMismatch(format!(
                "vector has {width} features, standardizer was fitted on {}",
                self.means.len()
            )));
        }
        Ok(())
    }
}
