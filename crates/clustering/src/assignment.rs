//! Cluster assignment of a single standardized vector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterAssignment {
    pub cluster: usize,
    /// In `[0, 1]`; see [`assignment_confidence`].
    pub confidence: f64,
    /// Euclidean distance to each centroid, in cluster order.
    pub distances: Vec<f64>,
}

/// Index of the smallest distance; the lowest index wins a tie.
pub fn nearest_centroid(distances: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &d) in distances.iter().enumerate() {
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// `1 - (d[cluster] - d_min) / (d_max - d_min)`, or 1.0 when every centroid
/// is equidistant. Clamped to `[0, 1]`.
pub fn assignment_confidence(distances: &[f64], cluster: usize) -> f64 {
    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let Some(&assigned) = distances.get(cluster) else {
        return 0.0;
    };
    if max == min {
        return 1.0;
    }
    (1.0 - (assigned - min) / (max - min)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_breaks_ties_by_lowest_index() {
        assert_eq!(nearest_centroid(&[3.0, 1.0, 1.0, 2.0]), Some(1));
        assert_eq!(nearest_centroid(&[]), None);
    }

    #[test]
    fn test_nearest_cluster_has_full_confidence() {
        let distances = [0.0, 4.0, 2.5];
        assert_eq!(assignment_confidence(&distances, 0), 1.0);
    }

    #[test]
    fn test_farthest_cluster_has_zero_confidence() {
        let distances = [1.0, 5.0, 3.0];
        assert_eq!(assignment_confidence(&distances, 1), 0.0);
        assert!((assignment_confidence(&distances, 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_equidistant_centroids_have_full_confidence() {
        assert_eq!(assignment_confidence(&[2.0, 2.0, 2.0], 1), 1.0);
    }

    #[test]
    fn test_confidence_stays_in_unit_interval() {
        let distances = [0.3, 7.1, 2.2, 9.9, 0.31];
        for c in 0..distances.len() {
            let confidence = assignment_confidence(&distances, c);
            assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
