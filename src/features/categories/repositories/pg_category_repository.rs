use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::core::database::{constraint_violation, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::core::error::{StoreError, StoreResult};
use crate::features::categories::models::{
    Category, CategoryChanges, CategoryCounts, CategoryListFilter, CategoryRow,
    CategoryTranslation, CategoryTranslationRow, NewCategory,
};
use crate::features::categories::repositories::CategoryRepository;

const CATEGORY_COLUMNS: &str = "id, slug, parent_id, display_order, active, created_at, updated_at";
const CATEGORY_ORDER: &str = " ORDER BY display_order, created_at, id";

/// Postgres-backed category repository
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Map insert/update failures onto the cases the service translates.
    fn classify_write(err: sqlx::Error) -> StoreError {
        match constraint_violation(&err) {
            Some((code, constraint))
                if code == UNIQUE_VIOLATION && constraint == "categories_slug_key" =>
            {
                StoreError::UniqueViolation("slug".to_string())
            }
            Some((code, _)) if code == FOREIGN_KEY_VIOLATION => {
                StoreError::MissingReference("parentId".to_string())
            }
            _ => StoreError::Backend(err),
        }
    }

    async fn attach_translations(&self, rows: Vec<CategoryRow>) -> StoreResult<Vec<Category>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let translations = sqlx::query_as::<_, CategoryTranslationRow>(
            r#"
            SELECT category_id, language, name, description
            FROM category_translations
            WHERE category_id = ANY($1)
            ORDER BY language
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load category translations: {:?}", e);
            StoreError::Backend(e)
        })?;

        let mut by_category: HashMap<Uuid, Vec<CategoryTranslation>> = HashMap::new();
        for t in translations {
            by_category.entry(t.category_id).or_default().push(t.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let translations = by_category.remove(&row.id).unwrap_or_default();
                row.with_translations(translations)
            })
            .collect())
    }

    async fn attach_one(&self, row: Option<CategoryRow>) -> StoreResult<Option<Category>> {
        match row {
            Some(row) => Ok(self.attach_translations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_translations(
        tx: &mut Transaction<'_, Postgres>,
        category_id: Uuid,
        translations: &[CategoryTranslation],
    ) -> StoreResult<()> {
        if translations.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO category_translations (category_id, language, name, description) ",
        );
        builder.push_values(translations, |mut row, t| {
            row.push_bind(category_id)
                .push_bind(t.language.clone())
                .push_bind(t.name.clone())
                .push_bind(t.description.clone());
        });
        builder.build().execute(&mut **tx).await?;

        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn insert(&self, category: &NewCategory) -> StoreResult<Category> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r#"
            INSERT INTO categories (id, slug, parent_id, display_order, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&category.slug)
        .bind(category.parent_id)
        .bind(category.display_order)
        .bind(category.active)
        .fetch_one(&mut *tx)
        .await
        .map_err(Self::classify_write)?;

        Self::insert_translations(&mut tx, row.id, &category.translations).await?;
        tx.commit().await?;

        Ok(row.with_translations(category.translations.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.attach_one(row).await
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        self.attach_one(row).await
    }

    async fn list(&self, filter: &CategoryListFilter) -> StoreResult<Vec<Category>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {CATEGORY_COLUMNS} FROM categories"));
        if !filter.include_inactive {
            builder.push(" WHERE active = TRUE");
        }
        builder.push(CATEGORY_ORDER);
        if let Some(window) = filter.window {
            builder.push(" LIMIT ").push_bind(window.limit);
            builder.push(" OFFSET ").push_bind(window.offset);
        }

        let rows = builder
            .build_query_as::<CategoryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                StoreError::Backend(e)
            })?;

        self.attach_translations(rows).await
    }

    async fn count(&self, include_inactive: bool) -> StoreResult<i64> {
        let sql = if include_inactive {
            "SELECT COUNT(*) FROM categories"
        } else {
            "SELECT COUNT(*) FROM categories WHERE active = TRUE"
        };

        Ok(sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, changes: &CategoryChanges) -> StoreResult<Category> {
        let mut tx = self.pool.begin().await?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");
        if let Some(slug) = &changes.slug {
            builder.push(", slug = ").push_bind(slug.clone());
        }
        if let Some(parent_id) = changes.parent_id {
            builder.push(", parent_id = ").push_bind(parent_id);
        }
        if let Some(display_order) = changes.display_order {
            builder.push(", display_order = ").push_bind(display_order);
        }
        if let Some(active) = changes.active {
            builder.push(", active = ").push_bind(active);
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {CATEGORY_COLUMNS}"));

        let row = builder
            .build_query_as::<CategoryRow>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(Self::classify_write)?
            .ok_or(StoreError::RowNotFound)?;

        if let Some(translations) = &changes.translations {
            sqlx::query("DELETE FROM category_translations WHERE category_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_translations(&mut tx, id, translations).await?;
        }

        tx.commit().await?;

        self.attach_one(Some(row))
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some((code, _)) if code == FOREIGN_KEY_VIOLATION => StoreError::StillReferenced(
                    "child categories or catalog items".to_string(),
                ),
                _ => StoreError::Backend(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound);
        }

        Ok(())
    }

    async fn counts(&self) -> StoreResult<CategoryCounts> {
        let (total, active, inactive, roots) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE active),
                COUNT(*) FILTER (WHERE NOT active),
                COUNT(*) FILTER (WHERE parent_id IS NULL)
            FROM categories
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CategoryCounts {
            total,
            active,
            inactive,
            roots,
        })
    }
}
