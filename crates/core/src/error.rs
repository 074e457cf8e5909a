use std::path::PathBuf;
use thiserror::Error;

pub type LigaResult<T> = Result<T, LigaError>;

#[derive(Error, Debug)]
pub enum LigaError {
    /// A referenced `user_id` is absent from the active population.
    #[error("User {0} not found")]
    NotFound(String),

    /// Training data or a trained model is required but missing.
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Feature schema or encoding tables disagree with the fitted model.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Model store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the persisted model bundle. A missing file is kept distinct
/// from a file that exists but cannot be used.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("model bundle not found at {}", path.display())]
    Missing { path: PathBuf },

    #[error("model bundle at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LigaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LigaError::NotFound(_))
    }
}

impl From<config::ConfigError> for LigaError {
    fn from(err: config::ConfigError) -> Self {
        LigaError::Config(err.to_string())
    }
}
