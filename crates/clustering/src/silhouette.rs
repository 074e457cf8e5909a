use crate::kmeans::squared_distance;
use ndarray::Array2;

/// Mean silhouette coefficient over all points.
///
/// Per point: `(b - a) / max(a, b)` where `a` is the mean distance to the
/// other members of its cluster and `b` the mean distance to the nearest
/// other cluster. Members of singleton clusters score 0. Fewer than two
/// populated clusters gives 0.
pub fn silhouette_score(data: &Array2<f64>, labels: &[usize], k: usize) -> f64 {
    let n = data.nrows();
    let mut counts = vec![0usize; k];
    for &label in labels {
        counts[label] += 1;
    }
    if n < 2 || counts.iter().filter(|&&c| c > 0).count() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut sums = vec![0.0; k];
    for i in 0..n {
        let own = labels[i];
        if counts[own] <= 1 {
            continue;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if i != j {
                sums[labels[j]] += squared_distance(data.row(i), data.row(j)).sqrt();
            }
        }

        let a = sums[own] / (counts[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && counts[c] > 0)
            .map(|c| sums[c] / counts[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / n as f64
}
