//! Perfume catalog.

use common::ProductId;
use serde::Deserialize;
use storage::{Perfume, PerfumeRepository, StorageError};
use thiserror::Error;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid perfume name: must be between 2 and 100 characters")]
    InvalidName,

    #[error("Perfume already exists: {0}")]
    AlreadyExists(ProductId),

    #[error("Perfume not found: {0}")]
    NotFound(ProductId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Input for [`Catalog::create`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerfume {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewPerfume {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            brand: None,
            description: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ProductId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// Service over the perfume catalog.
#[derive(Debug, Clone)]
pub struct Catalog<R: PerfumeRepository> {
    repo: R,
}

impl<R: PerfumeRepository> Catalog<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a perfume, active by default.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, input: NewPerfume) -> Result<Perfume, CatalogError> {
        let name = input.name.trim();
        let chars = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
            return Err(CatalogError::InvalidName);
        }

        let perfume = Perfume {
            id: input
                .id
                .unwrap_or_else(|| ProductId::new(uuid::Uuid::new_v4().to_string())),
            name: name.to_string(),
            brand: input.brand,
            description: input.description,
            is_active: true,
        };

        match self.repo.insert(&perfume).await {
            Ok(()) => Ok(perfume),
            Err(StorageError::Duplicate(_)) => Err(CatalogError::AlreadyExists(perfume.id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &ProductId) -> Result<Option<Perfume>, CatalogError> {
        Ok(self.repo.get(id).await?)
    }

    /// Lists perfumes ordered by ID, skipping inactive ones unless asked.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Perfume>, CatalogError> {
        let mut perfumes = self.repo.list().await?;
        if !include_inactive {
            perfumes.retain(|p| p.is_active);
        }
        Ok(perfumes)
    }

    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, id: &ProductId) -> Result<(), CatalogError> {
        if self.repo.set_active(id, false).await? {
            Ok(())
        } else {
            Err(CatalogError::NotFound(id.clone()))
        }
    }

    /// Resolves the label shown for a product: the catalog name if known,
    /// then `fallback`, then the product ID itself.
    pub async fn display_name(
        &self,
        id: &ProductId,
        fallback: Option<&str>,
    ) -> Result<String, CatalogError> {
        if let Some(perfume) = self.repo.get(id).await? {
            return Ok(perfume.name);
        }
        Ok(fallback
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| id.to_string(), str::to_string))
    }
}
