use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::database::{constraint_violation, escape_like, FOREIGN_KEY_VIOLATION};
use crate::core::error::{StoreError, StoreResult};
use crate::features::catalog::models::{
    CatalogAggregates, CatalogItem, CatalogItemChanges, CatalogItemRow, CategorySummary,
    FilterSpec, NewCatalogItem, ProviderRow, ProviderSummary, ResourceFamily,
};
use crate::features::catalog::repositories::CatalogRepository;
use crate::features::categories::models::{CategoryTranslation, CategoryTranslationRow};

const ITEM_COLUMNS: &str =
    "id, provider_id, category_id, title, description, price, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CategorySummaryRow {
    id: Uuid,
    slug: String,
    parent_id: Option<Uuid>,
    active: bool,
}

/// Postgres-backed store for one catalog family. The family picks the table.
pub struct PgCatalogRepository {
    pool: PgPool,
    family: ResourceFamily,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool, family: ResourceFamily) -> Self {
        Self { pool, family }
    }

    fn table(&self) -> &'static str {
        self.family.table()
    }

    fn classify_write(&self, err: sqlx::Error) -> StoreError {
        match constraint_violation(&err) {
            Some((code, constraint)) if code == FOREIGN_KEY_VIOLATION => {
                if constraint == format!("{}_provider_id_fkey", self.table()) {
                    StoreError::MissingReference("providerId".to_string())
                } else if constraint == format!("{}_category_id_fkey", self.table()) {
                    StoreError::MissingReference("categoryId".to_string())
                } else {
                    StoreError::Backend(err)
                }
            }
            _ => StoreError::Backend(err),
        }
    }

    /// Append the WHERE clause for every supplied filter field.
    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &FilterSpec) {
        builder.push(" WHERE TRUE");

        if let Some(category_id) = filter.category_id {
            builder.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(provider_id) = filter.provider_id {
            builder.push(" AND provider_id = ").push_bind(provider_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    async fn grouped_counts(&self, column: &str) -> StoreResult<Vec<(Uuid, i64)>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(&format!(
            "SELECT {column}, COUNT(*) FROM {} GROUP BY {column} ORDER BY {column}",
            self.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn insert(&self, item: &NewCatalogItem) -> StoreResult<CatalogItem> {
        let row = sqlx::query_as::<_, CatalogItemRow>(&format!(
            r#"
            INSERT INTO {} (id, provider_id, category_id, title, description, price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#,
            self.table()
        ))
        .bind(Uuid::now_v7())
        .bind(item.provider_id)
        .bind(item.category_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.classify_write(e))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<CatalogItem>> {
        let row = sqlx::query_as::<_, CatalogItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM {} WHERE id = $1",
            self.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogItem::from))
    }

    async fn list(&self, filter: &FilterSpec) -> StoreResult<Vec<CatalogItem>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM {}",
            self.table()
        ));
        Self::push_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");
        builder.push(" LIMIT ").push_bind(filter.window.limit);
        builder.push(" OFFSET ").push_bind(filter.window.offset);

        let rows = builder
            .build_query_as::<CatalogItemRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {}: {:?}", self.table(), e);
                StoreError::Backend(e)
            })?;

        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn count(&self, filter: &FilterSpec) -> StoreResult<i64> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", self.table()));
        Self::push_filters(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn update(&self, id: Uuid, changes: &CatalogItemChanges) -> StoreResult<CatalogItem> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET updated_at = NOW()",
            self.table()
        ));
        if let Some(provider_id) = changes.provider_id {
            builder.push(", provider_id = ").push_bind(provider_id);
        }
        if let Some(category_id) = changes.category_id {
            builder.push(", category_id = ").push_bind(category_id);
        }
        if let Some(title) = &changes.title {
            builder.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(price) = changes.price {
            builder.push(", price = ").push_bind(price);
        }
        if let Some(status) = changes.status {
            builder.push(", status = ").push_bind(status);
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {ITEM_COLUMNS}"));

        let row = builder
            .build_query_as::<CatalogItemRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.classify_write(e))?
            .ok_or(StoreError::RowNotFound)?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound);
        }

        Ok(())
    }

    async fn aggregates(&self) -> StoreResult<CatalogAggregates> {
        let totals = async {
            sqlx::query_as::<_, (i64, i64, i64, Option<Decimal>)>(&format!(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'ACTIVE'),
                    COUNT(*) FILTER (WHERE status = 'INACTIVE'),
                    AVG(price)
                FROM {}
                "#,
                self.table()
            ))
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from)
        };

        let ((total, active, inactive, average_price), by_category, by_provider) = futures::try_join!(
            totals,
            self.grouped_counts("category_id"),
            self.grouped_counts("provider_id")
        )?;

        Ok(CatalogAggregates {
            total,
            active,
            inactive,
            average_price,
            by_category,
            by_provider,
        })
    }

    async fn providers(&self, ids: &[Uuid]) -> StoreResult<Vec<ProviderSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT p.id, p.user_id, u.name AS user_name, u.email AS user_email
            FROM providers p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProviderSummary::from).collect())
    }

    async fn categories(&self, ids: &[Uuid]) -> StoreResult<Vec<CategorySummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let (rows, translations) = futures::try_join!(
            sqlx::query_as::<_, CategorySummaryRow>(
                "SELECT id, slug, parent_id, active FROM categories WHERE id = ANY($1)",
            )
            .bind(ids)
            .fetch_all(&self.pool),
            sqlx::query_as::<_, CategoryTranslationRow>(
                r#"
                SELECT category_id, language, name, description
                FROM category_translations
                WHERE category_id = ANY($1)
                ORDER BY language
                "#,
            )
            .bind(ids)
            .fetch_all(&self.pool)
        )?;

        let mut by_category: HashMap<Uuid, Vec<CategoryTranslation>> = HashMap::new();
        for t in translations {
            by_category.entry(t.category_id).or_default().push(t.into());
        }

        Ok(rows
            .into_iter()
            .map(|r| CategorySummary {
                translations: by_category.remove(&r.id).unwrap_or_default(),
                id: r.id,
                slug: r.slug,
                parent_id: r.parent_id,
                active: r.active,
            })
            .collect())
    }
}
