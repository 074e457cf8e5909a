//! Population segmentation: k-means over standardized feature vectors,
//! per-user assignment confidence and per-cluster profiles.

pub mod assignment;
pub mod kmeans;
pub mod silhouette;
pub mod summary;

pub use assignment::{assignment_confidence, nearest_centroid, ClusterAssignment};
pub use kmeans::{ClusterModel, FitOutcome, KMeansParams};
pub use silhouette::silhouette_score;
pub use summary::{ClusterSummarizer, ClusterSummary, ClusterTraits};
