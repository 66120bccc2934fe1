mod pg_category_repository;

pub use pg_category_repository::PgCategoryRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::StoreResult;
use crate::features::categories::models::{
    Category, CategoryChanges, CategoryCounts, CategoryListFilter, NewCategory,
};

/// Storage for categories and their translations.
///
/// Reads return categories ordered by `display_order, created_at, id`.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a category. A slug clash is `UniqueViolation`, a missing
    /// parent is `MissingReference("parentId")`.
    async fn insert(&self, category: &NewCategory) -> StoreResult<Category>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Category>>;

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Category>>;

    async fn list(&self, filter: &CategoryListFilter) -> StoreResult<Vec<Category>>;

    async fn count(&self, include_inactive: bool) -> StoreResult<i64>;

    /// Apply `changes`; when translations are supplied they replace the
    /// stored set. `RowNotFound` when the id does not exist.
    async fn update(&self, id: Uuid, changes: &CategoryChanges) -> StoreResult<Category>;

    /// Remove the row. `RowNotFound` when absent, `StillReferenced` while
    /// child categories or catalog items point at it.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn counts(&self) -> StoreResult<CategoryCounts>;
}
