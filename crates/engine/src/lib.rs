//! Training pipeline, persisted model bundle and the analytics engine that
//! serves assignment, recommendation, similarity and insight queries.

pub mod engine;
pub mod snapshot;
pub mod store;
pub mod training;

pub use engine::AnalyticsEngine;
pub use snapshot::{AssignmentResult, ModelSnapshot, BUNDLE_FORMAT_VERSION};
pub use store::ModelStore;
pub use training::{Trainer, TrainingReport};
