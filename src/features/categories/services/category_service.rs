use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result, StoreError};
use crate::features::categories::dtos::{
    clean_translations, CategoryListDto, CategoryResponseDto, CategoryStatsDto, CategoryTreeDto,
    CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::models::{
    Category, CategoryChanges, CategoryListFilter, CategoryState, NewCategory,
};
use crate::features::categories::repositories::CategoryRepository;
use crate::modules::cache::QueryCache;
use crate::shared::constants::CATEGORIES_CACHE_TAG;
use crate::shared::types::{PageEnvelope, PageWindow, Pagination};

/// Service for the category lifecycle: create, update, soft delete
/// (deactivate), restore and hard delete.
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
    cache: QueryCache,
    /// Other cache tags whose reads embed category data
    dependent_tags: Vec<String>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepository>, cache: QueryCache) -> Self {
        Self {
            repository,
            cache,
            dependent_tags: Vec::new(),
        }
    }

    /// Also invalidate these tags after every category mutation.
    pub fn with_dependent_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependent_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Category with ID {} not found", id))
    }

    fn translate(id: Uuid, err: StoreError) -> AppError {
        match err {
            StoreError::RowNotFound => Self::not_found(id),
            StoreError::UniqueViolation(_) => {
                AppError::Conflict("A category with this slug already exists".to_string())
            }
            other => other.into(),
        }
    }

    async fn invalidate(&self) {
        self.cache.invalidate_tag(CATEGORIES_CACHE_TAG).await;
        for tag in &self.dependent_tags {
            self.cache.invalidate_tag(tag).await;
        }
    }

    async fn load(&self, id: Uuid) -> Result<Category> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| Self::translate(id, e))?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<Uuid>) -> Result<()> {
        let existing = self
            .repository
            .find_by_slug(slug)
            .await
            .map_err(AppError::from)?;

        match existing {
            Some(c) if Some(c.id) != owner => Err(AppError::Conflict(format!(
                "Category slug '{}' already exists",
                slug
            ))),
            _ => Ok(()),
        }
    }

    /// Reject a parent that does not exist or that would close a cycle.
    async fn ensure_valid_parent(&self, id: Option<Uuid>, parent_id: Uuid) -> Result<()> {
        if Some(parent_id) == id {
            return Err(AppError::Validation(
                "A category cannot be its own parent".to_string(),
            ));
        }

        // Walk up from the new parent; meeting `id` on the way means a cycle.
        let mut visited = HashSet::new();
        let mut cursor = Some(parent_id);
        while let Some(current) = cursor {
            if Some(current) == id {
                return Err(AppError::Validation(
                    "parentId would create a cycle in the category tree".to_string(),
                ));
            }
            if !visited.insert(current) {
                break;
            }

            let ancestor = self
                .repository
                .find_by_id(current)
                .await
                .map_err(AppError::from)?;
            cursor = match ancestor {
                Some(a) => a.parent_id,
                None if current == parent_id => {
                    return Err(AppError::Reference("parentId".to_string()))
                }
                None => None,
            };
        }

        Ok(())
    }

    /// Create a category. Active unless `active: false` is requested.
    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))?;

        let translations = clean_translations(dto.translations)?;
        self.ensure_slug_free(&dto.slug, None).await?;
        if let Some(parent_id) = dto.parent_id {
            self.ensure_valid_parent(None, parent_id).await?;
        }

        let new_category = NewCategory {
            slug: dto.slug,
            parent_id: dto.parent_id,
            display_order: dto.display_order,
            active: dto.active.unwrap_or(true),
            translations,
        };

        let category = self.repository.insert(&new_category).await.map_err(|e| {
            match e {
                StoreError::UniqueViolation(_) => AppError::Conflict(format!(
                    "Category slug '{}' already exists",
                    new_category.slug
                )),
                other => other.into(),
            }
        })?;

        self.invalidate().await;
        tracing::info!("Created category: {} ({})", category.id, category.slug);

        Ok(category.into())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CategoryResponseDto> {
        self.cache
            .get_or_load(CATEGORIES_CACHE_TAG, &format!("id:{id}"), || async {
                self.load(id).await.map(CategoryResponseDto::from)
            })
            .await
    }

    /// Public lookup by slug; inactive categories are not exposed.
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryResponseDto> {
        self.cache
            .get_or_load(CATEGORIES_CACHE_TAG, &format!("slug:{slug}"), || async {
                self.repository
                    .find_by_slug(slug)
                    .await
                    .map_err(AppError::from)?
                    .filter(|c| c.active)
                    .map(CategoryResponseDto::from)
                    .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
            })
            .await
    }

    /// List categories, flat or as a tree. Inactive ones are excluded
    /// unless `include_inactive` is set.
    pub async fn list(&self, include_inactive: bool, include_children: bool) -> Result<CategoryListDto> {
        let filter = CategoryListFilter {
            include_inactive,
            window: None,
        };

        if include_children {
            let tree = self
                .cache
                .get_or_load(
                    CATEGORIES_CACHE_TAG,
                    &format!("tree:{include_inactive}"),
                    || async {
                        let categories = self.repository.list(&filter).await?;
                        Ok(CategoryTreeDto::build_tree(categories))
                    },
                )
                .await?;
            Ok(CategoryListDto::Tree(tree))
        } else {
            let flat = self
                .cache
                .get_or_load(
                    CATEGORIES_CACHE_TAG,
                    &format!("list:{include_inactive}"),
                    || async {
                        let categories = self.repository.list(&filter).await?;
                        Ok(categories
                            .into_iter()
                            .map(CategoryResponseDto::from)
                            .collect::<Vec<_>>())
                    },
                )
                .await?;
            Ok(CategoryListDto::Flat(flat))
        }
    }

    pub async fn list_paginated(
        &self,
        window: PageWindow,
        include_inactive: bool,
    ) -> Result<PageEnvelope<CategoryResponseDto>> {
        let key = format!(
            "page:{}:{}:{}",
            window.limit, window.offset, include_inactive
        );

        self.cache
            .get_or_load(CATEGORIES_CACHE_TAG, &key, || async {
                let filter = CategoryListFilter {
                    include_inactive,
                    window: Some(window),
                };
                let (categories, total) = futures::try_join!(
                    self.repository.list(&filter),
                    self.repository.count(include_inactive)
                )?;

                Ok(PageEnvelope::new(
                    categories.into_iter().map(CategoryResponseDto::from).collect(),
                    Pagination::for_window(total, window),
                ))
            })
            .await
    }

    pub async fn stats(&self) -> Result<CategoryStatsDto> {
        self.cache
            .get_or_load(CATEGORIES_CACHE_TAG, "stats", || async {
                Ok(self.repository.counts().await?.into())
            })
            .await
    }

    /// Update slug, parent, display order, translations and active flag
    /// in one call. Only supplied fields change.
    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))?;

        let existing = self.load(id).await?;

        if let Some(slug) = dto.slug.as_deref().filter(|s| *s != existing.slug) {
            self.ensure_slug_free(slug, Some(id)).await?;
        }
        if let Some(Some(parent_id)) = dto.parent_id {
            if existing.parent_id != Some(parent_id) {
                self.ensure_valid_parent(Some(id), parent_id).await?;
            }
        }
        let translations = dto.translations.map(clean_translations).transpose()?;

        let changes = CategoryChanges {
            slug: dto.slug,
            parent_id: dto.parent_id,
            display_order: dto.display_order,
            active: dto.active,
            translations,
        };

        let category = self
            .repository
            .update(id, &changes)
            .await
            .map_err(|e| Self::translate(id, e))?;

        self.invalidate().await;
        tracing::info!("Updated category: {}", id);

        Ok(category.into())
    }

    async fn transition(&self, id: Uuid, target: CategoryState) -> Result<CategoryResponseDto> {
        let existing = self.load(id).await?;

        let category = if existing.state() == target {
            existing
        } else {
            self.repository
                .update(id, &CategoryChanges::activation(target.is_active()))
                .await
                .map_err(|e| Self::translate(id, e))?
        };

        self.invalidate().await;
        tracing::info!("Category {} is now {:?}", id, target);

        Ok(category.into())
    }

    /// Soft delete: mark the category inactive. No-op when already inactive.
    pub async fn deactivate(&self, id: Uuid) -> Result<CategoryResponseDto> {
        self.transition(id, CategoryState::Inactive).await
    }

    /// Undo a soft delete. No-op when already active.
    pub async fn restore(&self, id: Uuid) -> Result<CategoryResponseDto> {
        self.transition(id, CategoryState::Active).await
    }

    /// Remove the category row for good, whatever its state.
    pub async fn hard_delete(&self, id: Uuid) -> Result<()> {
        self.repository
            .delete(id)
            .await
            .map_err(|e| Self::translate(id, e))?;

        self.invalidate().await;
        tracing::info!("Deleted category: {}", id);

        Ok(())
    }
}
