//! JSON dataset of users and the insurance catalog.

use anyhow::Context;
use liga_core::population::Population;
use liga_core::types::{InsuranceProvider, ServiceCatalog, ServiceCatalogEntry, UserRecord};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// `{ "users": [...], "providers": [...], "services": [...] }` with one
/// already-joined record per user.
#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub providers: Vec<InsuranceProvider>,
    #[serde(default)]
    pub services: Vec<ServiceCatalogEntry>,
}

impl Dataset {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        let dataset: Dataset = serde_json::from_str(&raw)
            .with_context(|| format!("parsing dataset {}", path.display()))?;
        info!(
            path = %path.display(),
            users = dataset.users.len(),
            providers = dataset.providers.len(),
            services = dataset.services.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn into_parts(self) -> anyhow::Result<(Population, ServiceCatalog)> {
        let population = Population::new(self.users)?;
        Ok((population, ServiceCatalog::new(self.providers, self.services)))
    }
}
