mod pg_catalog_repository;

pub use pg_catalog_repository::PgCatalogRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::StoreResult;
use crate::features::catalog::models::{
    CatalogAggregates, CatalogItem, CatalogItemChanges, CategorySummary, FilterSpec,
    NewCatalogItem, ProviderSummary,
};

/// Store accessor for one catalog family (listings or services).
///
/// Items come back without relations; callers attach providers and
/// categories through [`CatalogRepository::providers`] and
/// [`CatalogRepository::categories`].
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// A dangling provider or category is `MissingReference` naming the
    /// API field (`providerId` / `categoryId`).
    async fn insert(&self, item: &NewCatalogItem) -> StoreResult<CatalogItem>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<CatalogItem>>;

    /// Matching rows, newest first (`created_at DESC, id DESC`), windowed.
    async fn list(&self, filter: &FilterSpec) -> StoreResult<Vec<CatalogItem>>;

    /// Number of rows matching the filter, ignoring the window.
    async fn count(&self, filter: &FilterSpec) -> StoreResult<i64>;

    /// `RowNotFound` when the id does not exist.
    async fn update(&self, id: Uuid, changes: &CatalogItemChanges) -> StoreResult<CatalogItem>;

    /// `RowNotFound` when the id does not exist.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn aggregates(&self) -> StoreResult<CatalogAggregates>;

    async fn providers(&self, ids: &[Uuid]) -> StoreResult<Vec<ProviderSummary>>;

    async fn categories(&self, ids: &[Uuid]) -> StoreResult<Vec<CategorySummary>>;
}
