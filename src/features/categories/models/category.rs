use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::types::PageWindow;

/// Lifecycle state of a category. Soft delete moves a category to
/// `Inactive`; restore moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryState {
    Active,
    Inactive,
}

impl CategoryState {
    pub fn from_active(active: bool) -> Self {
        if active {
            CategoryState::Active
        } else {
            CategoryState::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, CategoryState::Active)
    }
}

/// Category with its translations loaded
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub translations: Vec<CategoryTranslation>,
}

impl Category {
    pub fn state(&self) -> CategoryState {
        CategoryState::from_active(self.active)
    }
}

/// Database row for category (translations live in their own table)
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryRow {
    pub fn with_translations(self, translations: Vec<CategoryTranslation>) -> Category {
        Category {
            id: self.id,
            slug: self.slug,
            parent_id: self.parent_id,
            display_order: self.display_order,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            translations,
        }
    }
}

/// Name and description of a category in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryTranslation {
    /// Language code, e.g. "pt" or "en"
    pub language: String,
    pub name: String,
    pub description: Option<String>,
}

/// Database row for category translation
#[derive(Debug, Clone, FromRow)]
pub struct CategoryTranslationRow {
    pub category_id: Uuid,
    pub language: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<CategoryTranslationRow> for CategoryTranslation {
    fn from(r: CategoryTranslationRow) -> Self {
        Self {
            language: r.language,
            name: r.name,
            description: r.description,
        }
    }
}

/// Data for inserting a category. Translations are already cleaned.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub active: bool,
    pub translations: Vec<CategoryTranslation>,
}

/// Fields to change on a category; `None` leaves the column untouched.
/// `parent_id: Some(None)` detaches the category to the root.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub slug: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
    pub translations: Option<Vec<CategoryTranslation>>,
}

impl CategoryChanges {
    pub fn activation(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Default::default()
        }
    }
}

/// Which categories a list read returns
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryListFilter {
    pub include_inactive: bool,
    pub window: Option<PageWindow>,
}

/// Aggregate counts over all categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub roots: i64,
}
