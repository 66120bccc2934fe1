use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryCounts, CategoryTranslation};
use crate::shared::reconciliation::{LocalRow, SortValue};
use crate::shared::types::present_or_null;
use crate::shared::validation::{LANGUAGE_REGEX, SLUG_REGEX};

/// Response DTO for category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub translations: Vec<CategoryTranslation>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            slug: c.slug,
            parent_id: c.parent_id,
            display_order: c.display_order,
            active: c.active,
            created_at: c.created_at,
            updated_at: c.updated_at,
            translations: c.translations,
        }
    }
}

impl CategoryResponseDto {
    /// Name to display for `locale`: exact language match, then same base
    /// language ("pt" for "pt-BR" and the reverse), then the first
    /// translation, then the slug.
    pub fn display_name(&self, locale: &str) -> &str {
        let base = |code: &str| code.split('-').next().unwrap_or_default().to_string();

        self.translations
            .iter()
            .find(|t| t.language == locale)
            .or_else(|| {
                self.translations
                    .iter()
                    .find(|t| base(&t.language) == base(locale))
            })
            .or_else(|| self.translations.first())
            .map(|t| t.name.as_str())
            .unwrap_or(self.slug.as_str())
    }
}

/// Sortable columns of the admin category table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySortField {
    Name,
    Slug,
    DisplayOrder,
    CreatedAt,
}

impl LocalRow for CategoryResponseDto {
    type Field = CategorySortField;

    fn matches_search(&self, needle: &str) -> bool {
        self.slug.to_lowercase().contains(needle)
            || self
                .translations
                .iter()
                .any(|t| t.name.to_lowercase().contains(needle))
    }

    fn is_inactive(&self) -> bool {
        !self.active
    }

    fn sort_value(&self, field: CategorySortField, locale: &str) -> Option<SortValue> {
        Some(match field {
            CategorySortField::Name => SortValue::Text(self.display_name(locale).to_string()),
            CategorySortField::Slug => SortValue::Text(self.slug.clone()),
            CategorySortField::DisplayOrder => SortValue::Number(f64::from(self.display_order)),
            CategorySortField::CreatedAt => SortValue::Time(self.created_at),
        })
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub slug: String,
    pub display_order: i32,
    pub active: bool,
    pub translations: Vec<CategoryTranslation>,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    /// Build tree from a flat, already ordered list of categories.
    ///
    /// A category whose parent is not in the list (e.g. the parent is
    /// inactive and was filtered out) becomes a root.
    pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryTreeDto> {
        let ids: HashSet<Uuid> = categories.iter().map(|c| c.id).collect();

        categories
            .iter()
            .filter(|c| c.parent_id.map_or(true, |p| !ids.contains(&p)))
            .map(|root| Self::build_node(root, &categories))
            .collect()
    }

    fn build_node(category: &Category, all_categories: &[Category]) -> CategoryTreeDto {
        let children: Vec<CategoryTreeDto> = all_categories
            .iter()
            .filter(|c| c.parent_id == Some(category.id))
            .map(|child| Self::build_node(child, all_categories))
            .collect();

        CategoryTreeDto {
            id: category.id,
            slug: category.slug.clone(),
            display_order: category.display_order,
            active: category.active,
            translations: category.translations.clone(),
            children,
        }
    }
}

/// Category list response: flat, or nested when children were requested
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CategoryListDto {
    Flat(Vec<CategoryResponseDto>),
    Tree(Vec<CategoryTreeDto>),
}

/// Translation as submitted by the admin form. Entries with a blank name
/// are dropped instead of stored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TranslationInputDto {
    #[validate(regex(path = *LANGUAGE_REGEX, message = "Language must be a code like 'pt' or 'pt-BR'"))]
    pub language: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCategoryDto {
    #[validate(regex(path = *SLUG_REGEX, message = "Slug must be lowercase words separated by hyphens"))]
    pub slug: String,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub display_order: i32,
    /// Defaults to true
    pub active: Option<bool>,
    #[validate(nested)]
    pub translations: Vec<TranslationInputDto>,
}

/// Request DTO for updating a category. Every field is optional;
/// `parentId: null` moves the category to the root.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCategoryDto {
    #[validate(regex(path = *SLUG_REGEX, message = "Slug must be lowercase words separated by hyphens"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
    #[validate(nested)]
    pub translations: Option<Vec<TranslationInputDto>>,
}

/// Drop blank-name translations, trim values and reject duplicate languages.
/// Fails when nothing with a name is left.
pub fn clean_translations(input: Vec<TranslationInputDto>) -> Result<Vec<CategoryTranslation>> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(input.len());

    for t in input {
        let name = t.name.trim();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(t.language.clone()) {
            return Err(AppError::Validation(format!(
                "Duplicate translation for language '{}'",
                t.language
            )));
        }
        cleaned.push(CategoryTranslation {
            language: t.language,
            name: name.to_string(),
            description: t
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        });
    }

    if cleaned.is_empty() {
        return Err(AppError::Validation(
            "At least one translation with a name is required".to_string(),
        ));
    }

    Ok(cleaned)
}

/// Query params for listing categories
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListCategoriesQuery {
    /// Include inactive categories (default: false)
    pub include_inactive: Option<String>,
    /// Return a tree with nested children (default: false)
    pub include_children: Option<String>,
}

/// Query params for the paginated category list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaginatedCategoriesQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub include_inactive: Option<String>,
}

/// Response DTO for category statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsDto {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// Categories without a parent
    pub roots: i64,
}

impl From<CategoryCounts> for CategoryStatsDto {
    fn from(c: CategoryCounts) -> Self {
        Self {
            total: c.total,
            active: c.active,
            inactive: c.inactive,
            roots: c.roots,
        }
    }
}
