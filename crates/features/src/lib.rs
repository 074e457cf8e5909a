//! Feature pipeline: categorical encoding, mean imputation and
//! standardization of user records into model-ready vectors.

pub mod encoder;
pub mod imputer;
pub mod standardizer;

pub use encoder::{EncodedUser, EncodingFallback, FeatureEncoder};
pub use imputer::Imputer;
pub use standardizer::Standardizer;
