pub mod config;
pub mod error;
pub mod population;
pub mod schema;
pub mod types;

pub use config::AppConfig;
pub use error::{LigaError, LigaResult, StorageError};
pub use population::Population;
pub use schema::{Feature, FeatureSchema};
