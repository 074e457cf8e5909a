//! On-disk persistence of one model bundle as JSON.
//!
//! Saves go through a temp file in the destination directory that is synced
//! and then renamed over the target, so a loader sees either the previous
//! bundle or the new one and never a partial write.

use crate::snapshot::ModelSnapshot;
use liga_core::error::{LigaResult, StorageError};
use liga_features::FeatureEncoder;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save(&self, snapshot: &ModelSnapshot) -> LigaResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());
        let tmp = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        if let Err(err) = write_synced(&tmp, snapshot) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }
            .into());
        }

        info!(
            path = %self.path.display(),
            k = snapshot.model().k(),
            "Model bundle saved"
        );
        Ok(())
    }

    /// Read and verify the bundle. A missing file, an unusable file and a
    /// bundle built for other encoding tables each fail differently.
    pub fn load(&self, encoder: &FeatureEncoder) -> LigaResult<ModelSnapshot> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::Missing {
                    path: self.path.clone(),
                }
                .into())
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        let snapshot: ModelSnapshot =
            serde_json::from_slice(&bytes).map_err(|err| self.corrupt(err.to_string()))?;
        snapshot
            .check_consistency()
            .map_err(|reason| self.corrupt(reason))?;
        snapshot.ensure_compatible(encoder)?;

        info!(
            path = %self.path.display(),
            k = snapshot.model().k(),
            trained_at = %snapshot.trained_at(),
            "Model bundle loaded"
        );
        Ok(snapshot)
    }

    fn corrupt(&self, reason: String) -> StorageError {
        warn!(path = %self.path.display(), reason = %reason, "Rejecting model bundle");
        StorageError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

fn write_synced(path: &Path, snapshot: &ModelSnapshot) -> LigaResult<()> {
    let io_err = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, snapshot)?;
    writer.flush().map_err(io_err)?;
    let file = writer.into_inner().map_err(|err| io_err(err.into_error()))?;
    file.sync_all().map_err(io_err)?;
    Ok(())
}
