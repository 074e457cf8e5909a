//! K-means (Lloyd's algorithm) with k-means++ seeding and multiple restarts.
//!
//! All randomness comes from one `StdRng` seeded with `KMeansParams::seed`,
//! so the same population, seed and `k` always reproduce the same centroids
//! and labels.

use crate::assignment::{assignment_confidence, nearest_centroid, ClusterAssignment};
use crate::silhouette::silhouette_score;
use liga_core::error::{LigaError, LigaResult};
use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 5,
            n_init: 10,
            max_iter: 300,
            seed: 42,
        }
    }
}

/// Trained centroids plus the statistics of the fit that produced them.
/// Immutable once built; retraining produces a new model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterModel {
    centroids: Array2<f64>,
    params: KMeansParams,
    inertia: f64,
    silhouette: f64,
    n_iter: usize,
}

/// Everything a fit produces. Only `model` is kept past training.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: ClusterModel,
    pub labels: Vec<usize>,
    /// Inertia after each assignment step of the winning restart.
    pub inertia_history: Vec<f64>,
}

struct Run {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
    history: Vec<f64>,
    n_iter: usize,
}

impl ClusterModel {
    /// Fit `params.k` clusters on a standardized population, keeping the
    /// restart with the lowest inertia.
    pub fn fit(data: &Array2<f64>, params: &KMeansParams) -> LigaResult<FitOutcome> {
        let n = data.nrows();
        if n == 0 {
            return Err(LigaError::PreconditionNotMet(
                "cannot cluster an empty population".to_string(),
            ));
        }
        if params.k == 0 || params.k > n {
            return Err(LigaError::InvalidInput(format!(
                "cluster count must be in 1..={n}, got {}",
                params.k
            )));
        }
        if params.n_init == 0 {
            return Err(LigaError::InvalidInput("n_init must be at least 1".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut best: Option<Run> = None;

        for restart in 0..params.n_init {
            let init = kmeans_plus_plus(data, params.k, &mut rng);
            let run = lloyd(data, init, params.max_iter);
            debug!(
                restart = restart,
                inertia = run.inertia,
                iterations = run.n_iter,
                "k-means restart finished"
            );
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let run = best.ok_or_else(|| {
            LigaError::PreconditionNotMet("k-means produced no restart".to_string())
        })?;
        let silhouette = silhouette_score(data, &run.labels, params.k);

        info!(
            samples = n,
            k = params.k,
            inertia = run.inertia,
            iterations = run.n_iter,
            silhouette = silhouette,
            "k-means fit complete"
        );

        Ok(FitOutcome {
            model: ClusterModel {
                centroids: run.centroids,
                params: params.clone(),
                inertia: run.inertia,
                silhouette,
                n_iter: run.n_iter,
            },
            labels: run.labels,
            inertia_history: run.history,
        })
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn dim(&self) -> usize {
        self.centroids.ncols()
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Mean silhouette coefficient of the training population.
    pub fn silhouette(&self) -> f64 {
        self.silhouette
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Euclidean distance from `point` to every centroid, in cluster order.
    pub fn distances(&self, point: ArrayView1<f64>) -> LigaResult<Vec<f64>> {
        if point.len() != self.dim() {
            return Err(LigaError::SchemaMismatch(format!(
                "vector has {} features, model was fitted on {}",
                point.len(),
                self.dim()
            )));
        }
        Ok(self
            .centroids
            .axis_iter(Axis(0))
            .map(|c| squared_distance(point, c).sqrt())
            .collect())
    }

    /// Nearest centroid (lowest index on ties) and assignment confidence.
    pub fn predict(&self, point: ArrayView1<f64>) -> LigaResult<ClusterAssignment> {
        let distances = self.distances(point)?;
        let cluster = nearest_centroid(&distances).ok_or_else(|| {
            LigaError::PreconditionNotMet("cluster model has no centroids".to_string())
        })?;
        let confidence = assignment_confidence(&distances, cluster);
        Ok(ClusterAssignment {
            cluster,
            confidence,
            distances,
        })
    }

    pub fn predict_batch(&self, data: &Array2<f64>) -> LigaResult<Vec<usize>> {
        data.axis_iter(Axis(0))
            .map(|row| self.predict(row).map(|a| a.cluster))
            .collect()
    }
}

pub(crate) fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// k-means++: first centroid uniform, each next one sampled with probability
/// proportional to its squared distance from the closest chosen centroid.
fn kmeans_plus_plus(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));
    let mut closest: Vec<f64> = data
        .axis_iter(Axis(0))
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            // Last positive-weight point guards against rounding in `acc`.
            let mut chosen = closest.iter().rposition(|&d| d > 0.0).unwrap_or(n - 1);
            for (i, &d) in closest.iter().enumerate() {
                acc += d;
                if d > 0.0 && acc > target {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(chosen));
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let d = squared_distance(row, centroids.row(c));
            if d < closest[i] {
                closest[i] = d;
            }
        }
    }

    centroids
}

fn lloyd(data: &Array2<f64>, mut centroids: Array2<f64>, max_iter: usize) -> Run {
    let mut labels = vec![usize::MAX; data.nrows()];
    let mut history = Vec::new();
    let mut n_iter = 0;

    loop {
        let (changed, inertia) = assign_points(data, &centroids, &mut labels);
        history.push(inertia);
        if !changed || n_iter >= max_iter {
            break;
        }
        n_iter += 1;
        centroids = update_centroids(data, &labels, centroids.nrows());
    }

    let inertia = history.last().copied().unwrap_or(0.0);
    Run {
        centroids,
        labels,
        inertia,
        history,
        n_iter,
    }
}

/// Assign every point to its nearest centroid. Returns whether any label
/// changed and the resulting inertia.
fn assign_points(data: &Array2<f64>, centroids: &Array2<f64>, labels: &mut [usize]) -> (bool, f64) {
    let mut changed = false;
    let mut inertia = 0.0;
    for (i, row) in data.axis_iter(Axis(0)).enumerate() {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
            let d = squared_distance(row, centroid);
            if d < best_dist {
                best = c;
                best_dist = d;
            }
        }
        if labels[i] != best {
            labels[i] = best;
            changed = true;
        }
        inertia += best_dist;
    }
    (changed, inertia)
}

/// Recompute centroids as member means. An empty cluster takes the point
/// farthest from its own cluster's new centroid (lowest index on ties).
fn update_centroids(data: &Array2<f64>, labels: &[usize], k: usize) -> Array2<f64> {
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    let mut counts = vec![0usize; k];
    for (i, &label) in labels.iter().enumerate() {
        centroids.row_mut(label).scaled_add(1.0, &data.row(i));
        counts[label] += 1;
    }
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            centroids.row_mut(c).mapv_inplace(|v| v / count as f64);
        }
    }

    let empty: Vec<usize> = (0..k).filter(|&c| counts[c] == 0).collect();
    if !empty.is_empty() {
        let mut far: Vec<(usize, f64)> = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| (i, squared_distance(data.row(i), centroids.row(label))))
            .collect();
        far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        for (&cluster, &(point, _)) in empty.iter().zip(far.iter()) {
            debug!(cluster = cluster, point = point, "Relocating empty cluster");
            centroids.row_mut(cluster).assign(&data.row(point));
        }
    }

    centroids
}
