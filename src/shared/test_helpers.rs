//! In-memory store implementations and fixtures shared by unit and HTTP tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::error::{StoreError, StoreResult};
use crate::features::catalog::models::{
    CatalogAggregates, CatalogItem, CatalogItemChanges, CatalogStatus, CategorySummary,
    FilterSpec, NewCatalogItem, ProviderSummary, ProviderUser,
};
use crate::features::catalog::repositories::CatalogRepository;
use crate::features::categories::models::{
    Category, CategoryChanges, CategoryCounts, CategoryListFilter, CategoryTranslation,
    NewCategory,
};
use crate::features::categories::repositories::CategoryRepository;

pub fn translation(language: &str, name: &str) -> CategoryTranslation {
    CategoryTranslation {
        language: language.to_string(),
        name: name.to_string(),
        description: None,
    }
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    rows: Mutex<Vec<Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row as-is, bypassing the uniqueness and parent checks.
    pub fn seed(&self, category: Category) {
        self.rows.lock().unwrap().push(category);
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.rows.lock().unwrap().iter().any(|c| c.id == id)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn insert(&self, category: &NewCategory) -> StoreResult<Category> {
        let mut rows = self.rows.lock().unwrap();

        if rows.iter().any(|c| c.slug == category.slug) {
            return Err(StoreError::UniqueViolation("slug".to_string()));
        }
        if let Some(parent_id) = category.parent_id {
            if !rows.iter().any(|c| c.id == parent_id) {
                return Err(StoreError::MissingReference("parentId".to_string()));
            }
        }

        let now = Utc::now();
        let created = Category {
            id: Uuid::now_v7(),
            slug: category.slug.clone(),
            parent_id: category.parent_id,
            display_order: category.display_order,
            active: category.active,
            created_at: now,
            updated_at: now,
            translations: category.translations.clone(),
        };
        rows.push(created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list(&self, filter: &CategoryListFilter) -> StoreResult<Vec<Category>> {
        let mut matching: Vec<Category> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| filter.include_inactive || c.active)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (a.display_order, a.created_at, a.id).cmp(&(b.display_order, b.created_at, b.id))
        });

        Ok(match filter.window {
            Some(w) => matching
                .into_iter()
                .skip(w.offset as usize)
                .take(w.limit as usize)
                .collect(),
            None => matching,
        })
    }

    async fn count(&self, include_inactive: bool) -> StoreResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| include_inactive || c.active)
            .count() as i64)
    }

    async fn update(&self, id: Uuid, changes: &CategoryChanges) -> StoreResult<Category> {
        let mut rows = self.rows.lock().unwrap();

        if let Some(slug) = &changes.slug {
            if rows.iter().any(|c| c.id != id && &c.slug == slug) {
                return Err(StoreError::UniqueViolation("slug".to_string()));
            }
        }
        if let Some(Some(parent_id)) = changes.parent_id {
            if !rows.iter().any(|c| c.id == parent_id) {
                return Err(StoreError::MissingReference("parentId".to_string()));
            }
        }

        let row = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::RowNotFound)?;

        if let Some(slug) = &changes.slug {
            row.slug = slug.clone();
        }
        if let Some(parent_id) = changes.parent_id {
            row.parent_id = parent_id;
        }
        if let Some(display_order) = changes.display_order {
            row.display_order = display_order;
        }
        if let Some(active) = changes.active {
            row.active = active;
        }
        if let Some(translations) = &changes.translations {
            row.translations = translations.clone();
        }
        row.updated_at = Utc::now();

        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut rows = self.rows.lock().unwrap();

        if !rows.iter().any(|c| c.id == id) {
            return Err(StoreError::RowNotFound);
        }
        if rows.iter().any(|c| c.parent_id == Some(id)) {
            return Err(StoreError::StillReferenced(
                "child categories or catalog items".to_string(),
            ));
        }

        rows.retain(|c| c.id != id);
        Ok(())
    }

    async fn counts(&self) -> StoreResult<CategoryCounts> {
        let rows = self.rows.lock().unwrap();
        let active = rows.iter().filter(|c| c.active).count() as i64;

        Ok(CategoryCounts {
            total: rows.len() as i64,
            active,
            inactive: rows.len() as i64 - active,
            roots: rows.iter().filter(|c| c.parent_id.is_none()).count() as i64,
        })
    }
}

// =============================================================================
// CATALOG ITEMS
// =============================================================================

/// Random short title
pub fn fake_title() -> String {
    let words: Vec<String> = Words(2..4).fake();
    words.join(" ")
}

/// An item created `minutes_ago` minutes before now.
pub fn catalog_item(
    provider_id: Uuid,
    category_id: Uuid,
    title: &str,
    price: Option<Decimal>,
    status: CatalogStatus,
    minutes_ago: i64,
) -> CatalogItem {
    let at = Utc::now() - Duration::minutes(minutes_ago);
    CatalogItem {
        id: Uuid::now_v7(),
        provider_id,
        category_id,
        title: title.to_string(),
        description: None,
        price,
        status,
        created_at: at,
        updated_at: at,
        provider: None,
        category: None,
    }
}

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: Mutex<Vec<CatalogItem>>,
    providers: Mutex<Vec<ProviderSummary>>,
    categories: Mutex<Vec<CategorySummary>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider with a generated user.
    pub fn add_provider(&self) -> Uuid {
        let id = Uuid::now_v7();
        self.providers.lock().unwrap().push(ProviderSummary {
            id,
            user: ProviderUser {
                id: Uuid::now_v7(),
                name: Name().fake(),
                email: SafeEmail().fake(),
            },
        });
        id
    }

    pub fn add_category(&self, slug: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.categories.lock().unwrap().push(CategorySummary {
            id,
            slug: slug.to_string(),
            parent_id: None,
            active: true,
            translations: vec![translation("pt", slug)],
        });
        id
    }

    pub fn seed(&self, item: CatalogItem) {
        self.items.lock().unwrap().push(item);
    }

    fn check_references(&self, provider_id: Option<Uuid>, category_id: Option<Uuid>) -> StoreResult<()> {
        if let Some(id) = provider_id {
            if !self.providers.lock().unwrap().iter().any(|p| p.id == id) {
                return Err(StoreError::MissingReference("providerId".to_string()));
            }
        }
        if let Some(id) = category_id {
            if !self.categories.lock().unwrap().iter().any(|c| c.id == id) {
                return Err(StoreError::MissingReference("categoryId".to_string()));
            }
        }
        Ok(())
    }

    fn matching(&self, filter: &FilterSpec) -> Vec<CatalogItem> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut items: Vec<CatalogItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| filter.category_id.map_or(true, |c| i.category_id == c))
            .filter(|i| filter.provider_id.map_or(true, |p| i.provider_id == p))
            .filter(|i| filter.status.map_or(true, |s| i.status == s))
            .filter(|i| match &needle {
                Some(n) => {
                    i.title.to_lowercase().contains(n)
                        || i.description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(n))
                }
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        items
    }
}

fn grouped(items: &[CatalogItem], key: impl Fn(&CatalogItem) -> Uuid) -> Vec<(Uuid, i64)> {
    let mut counts: BTreeMap<Uuid, i64> = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_default() += 1;
    }
    counts.into_iter().collect()
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn insert(&self, item: &NewCatalogItem) -> StoreResult<CatalogItem> {
        self.check_references(Some(item.provider_id), Some(item.category_id))?;

        let now: DateTime<Utc> = Utc::now();
        let created = CatalogItem {
            id: Uuid::now_v7(),
            provider_id: item.provider_id,
            category_id: item.category_id,
            title: item.title.clone(),
            description: item.description.clone(),
            price: item.price,
            status: item.status,
            created_at: now,
            updated_at: now,
            provider: None,
            category: None,
        };
        self.items.lock().unwrap().push(created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<CatalogItem>> {
        Ok(self.items.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, filter: &FilterSpec) -> StoreResult<Vec<CatalogItem>> {
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(filter.window.offset as usize)
            .take(filter.window.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &FilterSpec) -> StoreResult<i64> {
        Ok(self.matching(filter).len() as i64)
    }

    async fn update(&self, id: Uuid, changes: &CatalogItemChanges) -> StoreResult<CatalogItem> {
        let mut items = self.items.lock().unwrap();
        // a zero-row UPDATE never reaches the foreign keys
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::RowNotFound)?;
        self.check_references(changes.provider_id, changes.category_id)?;

        if let Some(provider_id) = changes.provider_id {
            item.provider_id = provider_id;
        }
        if let Some(category_id) = changes.category_id {
            item.category_id = category_id;
        }
        if let Some(title) = &changes.title {
            item.title = title.clone();
        }
        if let Some(description) = &changes.description {
            item.description = description.clone();
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        if let Some(status) = changes.status {
            item.status = status;
        }
        item.updated_at = Utc::now();

        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.id != id);

        if items.len() == before {
            return Err(StoreError::RowNotFound);
        }
        Ok(())
    }

    async fn aggregates(&self) -> StoreResult<CatalogAggregates> {
        let items = self.items.lock().unwrap();
        let prices: Vec<Decimal> = items.iter().filter_map(|i| i.price).collect();
        let average_price = if prices.is_empty() {
            None
        } else {
            Some(prices.iter().sum::<Decimal>() / Decimal::from(prices.len()))
        };
        let active = items
            .iter()
            .filter(|i| i.status == CatalogStatus::Active)
            .count() as i64;

        Ok(CatalogAggregates {
            total: items.len() as i64,
            active,
            inactive: items.len() as i64 - active,
            average_price,
            by_category: grouped(&items, |i| i.category_id),
            by_provider: grouped(&items, |i| i.provider_id),
        })
    }

    async fn providers(&self, ids: &[Uuid]) -> StoreResult<Vec<ProviderSummary>> {
        Ok(self
            .providers
            .lock()
            .unwrap()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn categories(&self, ids: &[Uuid]) -> StoreResult<Vec<CategorySummary>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }
}
