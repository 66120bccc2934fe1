use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result, StoreError};
use crate::features::catalog::dtos::{
    CatalogItemResponseDto, CreateCatalogItemDto, StatsSnapshotDto, UpdateCatalogItemDto,
};
use crate::features::catalog::models::{
    CatalogItem, CatalogItemChanges, Expansion, FilterSpec, NewCatalogItem, ResourceFamily,
};
use crate::features::catalog::repositories::CatalogRepository;
use crate::modules::cache::QueryCache;
use crate::shared::types::{PageEnvelope, Pagination};

/// Query and mutation service for one catalog family.
///
/// Listings and services share this implementation; each gets its own
/// instance bound to its own store and cache tag.
pub struct CatalogService {
    family: ResourceFamily,
    repository: Arc<dyn CatalogRepository>,
    cache: QueryCache,
}

impl CatalogService {
    pub fn new(
        family: ResourceFamily,
        repository: Arc<dyn CatalogRepository>,
        cache: QueryCache,
    ) -> Self {
        Self {
            family,
            repository,
            cache,
        }
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::NotFound(format!("{} with ID {} not found", self.family.label(), id))
    }

    /// Translate store failures for an addressed row. A missing row is
    /// NotFound; anything unclassified stays an internal error.
    fn translate(&self, id: Uuid, err: StoreError) -> AppError {
        match err {
            StoreError::RowNotFound => self.not_found(id),
            other => other.into(),
        }
    }

    fn check_title(title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be blank".to_string()));
        }
        Ok(title.to_string())
    }

    fn check_price(price: Option<Decimal>) -> Result<()> {
        match price {
            Some(p) if p < Decimal::ZERO => Err(AppError::Validation(
                "price must be greater than or equal to 0".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn invalidate(&self) {
        self.cache.invalidate_tag(self.family.cache_tag()).await;
    }

    /// Attach the requested relations to each item.
    async fn expand(&self, mut items: Vec<CatalogItem>, expand: Expansion) -> Result<Vec<CatalogItem>> {
        if items.is_empty() || expand == Expansion::none() {
            return Ok(items);
        }

        let provider_ids: Vec<Uuid> = if expand.provider {
            items
                .iter()
                .map(|i| i.provider_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };
        let category_ids: Vec<Uuid> = if expand.category {
            items
                .iter()
                .map(|i| i.category_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        let (providers, categories) = futures::try_join!(
            self.repository.providers(&provider_ids),
            self.repository.categories(&category_ids)
        )?;

        let providers: HashMap<Uuid, _> = providers.into_iter().map(|p| (p.id, p)).collect();
        let categories: HashMap<Uuid, _> = categories.into_iter().map(|c| (c.id, c)).collect();

        for item in &mut items {
            if expand.provider {
                item.provider = providers.get(&item.provider_id).cloned();
            }
            if expand.category {
                item.category = categories.get(&item.category_id).cloned();
            }
        }

        Ok(items)
    }

    async fn expand_one(&self, item: CatalogItem) -> Result<CatalogItemResponseDto> {
        let id = item.id;
        self.expand(vec![item], Expansion::all())
            .await?
            .pop()
            .map(CatalogItemResponseDto::from)
            .ok_or_else(|| self.not_found(id))
    }

    /// Create an item. Returned with provider and category attached.
    pub async fn create(&self, dto: CreateCatalogItemDto) -> Result<CatalogItemResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))?;
        Self::check_price(dto.price)?;

        let new_item = NewCatalogItem {
            provider_id: dto.provider_id,
            category_id: dto.category_id,
            title: Self::check_title(&dto.title)?,
            description: dto.description,
            price: dto.price,
            status: dto.status.unwrap_or_default(),
        };

        let item = self.repository.insert(&new_item).await.map_err(|e| {
            if !matches!(e, StoreError::MissingReference(_)) {
                tracing::error!("Failed to create {}: {:?}", self.family.label(), e);
            }
            AppError::from(e)
        })?;

        self.invalidate().await;
        tracing::info!("Created {}: {}", self.family.label(), item.id);

        self.expand_one(item).await
    }

    /// One page of matching items, newest first.
    ///
    /// Rows and count are fetched concurrently and are not read in one
    /// snapshot, so a concurrent write may make `total` disagree with the
    /// boundary page.
    pub async fn list(&self, filter: FilterSpec) -> Result<PageEnvelope<CatalogItemResponseDto>> {
        let key = filter.cache_key();

        self.cache
            .get_or_load(self.family.cache_tag(), &key, || async {
                let (items, total) = futures::try_join!(
                    self.repository.list(&filter),
                    self.repository.count(&filter)
                )?;
                let items = self.expand(items, filter.expand).await?;

                Ok(PageEnvelope::new(
                    items.into_iter().map(CatalogItemResponseDto::from).collect(),
                    Pagination::for_window(total, filter.window),
                ))
            })
            .await
    }

    /// Single item with both relations attached.
    pub async fn get_by_id(&self, id: Uuid) -> Result<CatalogItemResponseDto> {
        self.cache
            .get_or_load(self.family.cache_tag(), &format!("id:{id}"), || async {
                let item = self
                    .repository
                    .find_by_id(id)
                    .await
                    .map_err(AppError::from)?
                    .ok_or_else(|| self.not_found(id))?;
                self.expand_one(item).await
            })
            .await
    }

    /// Apply only the supplied fields.
    pub async fn update(&self, id: Uuid, dto: UpdateCatalogItemDto) -> Result<CatalogItemResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))?;
        Self::check_price(dto.price.flatten())?;

        let changes = CatalogItemChanges {
            provider_id: dto.provider_id,
            category_id: dto.category_id,
            title: dto.title.as_deref().map(Self::check_title).transpose()?,
            description: dto.description,
            price: dto.price,
            status: dto.status,
        };

        let item = self
            .repository
            .update(id, &changes)
            .await
            .map_err(|e| self.translate(id, e))?;

        self.invalidate().await;
        tracing::info!("Updated {}: {}", self.family.label(), id);

        self.expand_one(item).await
    }

    /// Hard delete. Deleting a missing id is NotFound.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        self.repository
            .delete(id)
            .await
            .map_err(|e| self.translate(id, e))?;

        self.invalidate().await;
        tracing::info!("Deleted {}: {}", self.family.label(), id);

        Ok(())
    }

    pub async fn stats(&self) -> Result<StatsSnapshotDto> {
        self.cache
            .get_or_load(self.family.cache_tag(), "stats", || async {
                Ok(self.repository.aggregates().await?.into())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CacheConfig;
    use crate::features::catalog::models::CatalogStatus;
    use crate::shared::test_helpers::{catalog_item, fake_title, InMemoryCatalogRepository};
    use crate::shared::types::PageWindow;

    struct Fixture {
        service: CatalogService,
        repo: Arc<InMemoryCatalogRepository>,
        provider_id: Uuid,
        category_id: Uuid,
    }

    fn fixture_with(cache: QueryCache) -> Fixture {
        let repo = Arc::new(InMemoryCatalogRepository::new());
        let provider_id = repo.add_provider();
        let category_id = repo.add_category("beleza");
        Fixture {
            service: CatalogService::new(ResourceFamily::Service, repo.clone(), cache),
            repo,
            provider_id,
            category_id,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(QueryCache::disabled())
    }

    impl Fixture {
        fn create_dto(&self, title: &str) -> CreateCatalogItemDto {
            CreateCatalogItemDto {
                provider_id: self.provider_id,
                category_id: self.category_id,
                title: title.to_string(),
                description: None,
                price: None,
                status: None,
            }
        }

        fn seed_many(&self, n: i64) {
            for i in 0..n {
                self.repo.seed(catalog_item(
                    self.provider_id,
                    self.category_id,
                    &fake_title(),
                    None,
                    CatalogStatus::Active,
                    i,
                ));
            }
        }
    }

    fn window(limit: i64, offset: i64) -> FilterSpec {
        FilterSpec {
            window: PageWindow::new(limit, offset).unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_stats() {
        let f = fixture();
        let created = f.service.create(f.create_dto("Corte de cabelo")).await.unwrap();

        assert_eq!(created.status, CatalogStatus::Active);
        assert!(created.provider.is_some());
        assert_eq!(created.category.as_ref().unwrap().slug, "beleza");

        let stats = f.service.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive, 0);
        assert_eq!(stats.average_price, 0.0);
        assert_eq!(stats.by_category.get(&f.category_id.to_string()), Some(&1));
    }

    #[tokio::test]
    async fn test_stats_on_empty_family() {
        let f = fixture();
        let stats = f.service.stats().await.unwrap();

        assert_eq!(stats.total, 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.inactive, 0);
        assert_eq!(stats.average_price, 0.0);
    }

    #[tokio::test]
    async fn test_stats_average_ignores_unpriced() {
        let f = fixture();
        for (price, status) in [
            (Some(Decimal::new(1000, 2)), CatalogStatus::Active),
            (Some(Decimal::new(3000, 2)), CatalogStatus::Inactive),
            (None, CatalogStatus::Active),
        ] {
            f.repo.seed(catalog_item(f.provider_id, f.category_id, "x", price, status, 0));
        }

        let stats = f.service.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.average_price, 20.0);
    }

    #[tokio::test]
    async fn test_create_with_dangling_reference() {
        let f = fixture();
        let mut dto = f.create_dto("Corte");
        dto.category_id = Uuid::now_v7();

        let result = f.service.create(dto).await;
        assert!(matches!(result, Err(AppError::Reference(field)) if field == "categoryId"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_and_negative_price() {
        let f = fixture();

        let blank = f.service.create(f.create_dto("   ")).await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let mut dto = f.create_dto("Corte");
        dto.price = Some(Decimal::new(-1, 0));
        assert!(matches!(
            f.service.create(dto).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_first_page_of_twenty_five() {
        let f = fixture();
        f.seed_many(25);

        let page = f.service.list(window(10, 0)).await.unwrap();
        assert_eq!(page.data.len(), 10);
        assert_eq!(
            page.pagination,
            Pagination {
                total: 25,
                page: 1,
                limit: 10,
                total_pages: 3,
                has_next: true,
                has_prev: false,
            }
        );
    }

    #[tokio::test]
    async fn test_list_offset_beyond_total() {
        let f = fixture();
        f.seed_many(3);

        let page = f.service.list(window(10, 30)).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 3);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_stable() {
        let f = fixture();
        f.seed_many(5);

        let first = f.service.list(window(5, 0)).await.unwrap();
        let again = f.service.list(window(5, 0)).await.unwrap();
        assert_eq!(first.data, again.data);

        for pair in first.data.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_expansion_does_not_change_rows() {
        let f = fixture();
        f.seed_many(4);

        let plain = f.service.list(window(10, 0)).await.unwrap();
        assert!(plain
            .data
            .iter()
            .all(|i| i.provider.is_none() && i.category.is_none()));

        let expanded = f
            .service
            .list(FilterSpec {
                expand: Expansion {
                    provider: true,
                    category: false,
                },
                ..window(10, 0)
            })
            .await
            .unwrap();
        assert!(expanded
            .data
            .iter()
            .all(|i| i.provider.is_some() && i.category.is_none()));

        let plain_ids: Vec<Uuid> = plain.data.iter().map(|i| i.id).collect();
        let expanded_ids: Vec<Uuid> = expanded.data.iter().map(|i| i.id).collect();
        assert_eq!(plain_ids, expanded_ids);
        assert_eq!(plain.pagination, expanded.pagination);
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description() {
        let f = fixture();
        let mut with_description =
            catalog_item(f.provider_id, f.category_id, "Manicure", None, CatalogStatus::Active, 1);
        with_description.description = Some("Inclui CORTE de unhas".to_string());
        f.repo.seed(with_description);
        f.repo.seed(catalog_item(
            f.provider_id,
            f.category_id,
            "Corte de cabelo",
            None,
            CatalogStatus::Active,
            2,
        ));
        f.repo.seed(catalog_item(
            f.provider_id,
            f.category_id,
            "Massagem",
            None,
            CatalogStatus::Active,
            3,
        ));

        let page = f
            .service
            .list(FilterSpec {
                search: Some("corte".to_string()),
                ..window(10, 0)
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.data.len(), 2);
    }

    #[tokio::test]
    async fn test_update_applies_only_supplied_fields() {
        let f = fixture();
        let mut dto = f.create_dto("Corte");
        dto.price = Some(Decimal::new(50, 0));
        dto.description = Some("Rapido".to_string());
        let created = f.service.create(dto).await.unwrap();

        let updated = f
            .service
            .update(
                created.id,
                UpdateCatalogItemDto {
                    price: Some(None),
                    status: Some(CatalogStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Corte");
        assert_eq!(updated.description.as_deref(), Some("Rapido"));
        assert_eq!(updated.price, None);
        assert_eq!(updated.status, CatalogStatus::Inactive);
    }

    #[tokio::test]
    async fn test_update_with_dangling_reference() {
        let f = fixture();
        let created = f.service.create(f.create_dto("Corte")).await.unwrap();

        let result = f
            .service
            .update(
                created.id,
                UpdateCatalogItemDto {
                    category_id: Some(Uuid::now_v7()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Reference(field)) if field == "categoryId"));

        let result = f
            .service
            .update(
                created.id,
                UpdateCatalogItemDto {
                    provider_id: Some(Uuid::now_v7()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Reference(field)) if field == "providerId"));

        // the row is left unchanged
        let stored = f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(stored.category_id, f.category_id);
        assert_eq!(stored.provider_id, f.provider_id);
    }

    #[tokio::test]
    async fn test_update_missing_id_wins_over_dangling_reference() {
        let f = fixture();
        let result = f
            .service
            .update(
                Uuid::now_v7(),
                UpdateCatalogItemDto {
                    category_id: Some(Uuid::now_v7()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let f = fixture();
        let id = Uuid::now_v7();

        match f.service.remove(id).await {
            Err(AppError::NotFound(message)) => {
                assert_eq!(message, format!("Service with ID {} not found", id))
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(matches!(
            f.service.update(id, UpdateCatalogItemDto::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.get_by_id(id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mutations_invalidate_cached_reads() {
        let f = fixture_with(QueryCache::new(&CacheConfig {
            enabled: true,
            ttl_secs: 60,
            max_capacity: 100,
        }));

        let created = f.service.create(f.create_dto("Corte")).await.unwrap();
        assert_eq!(f.service.list(window(10, 0)).await.unwrap().pagination.total, 1);
        assert_eq!(f.service.stats().await.unwrap().total, 1);

        f.service.create(f.create_dto("Escova")).await.unwrap();
        assert_eq!(f.service.list(window(10, 0)).await.unwrap().pagination.total, 2);
        assert_eq!(f.service.stats().await.unwrap().total, 2);

        f.service.remove(created.id).await.unwrap();
        assert_eq!(f.service.stats().await.unwrap().total, 1);
        assert!(matches!(
            f.service.get_by_id(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let f = fixture_with(QueryCache::new(&CacheConfig {
            enabled: true,
            ttl_secs: 60,
            max_capacity: 100,
        }));
        f.service.stats().await.unwrap();

        // a write that bypasses the service is invisible until invalidation
        f.seed_many(1);
        assert!(f.service.remove(Uuid::now_v7()).await.is_err());
        assert_eq!(f.service.stats().await.unwrap().total, 0);
    }
}
