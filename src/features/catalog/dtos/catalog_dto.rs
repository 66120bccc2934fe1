use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::catalog::models::{
    CatalogAggregates, CatalogItem, CatalogStatus, CategorySummary, Expansion, FilterSpec,
    ProviderSummary,
};
use crate::shared::reconciliation::{LocalRow, SortValue};
use crate::shared::types::{present_or_null, PageWindow};
use crate::shared::validation::parse_flag;

/// Response DTO for a listing or service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemResponseDto {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
}

impl From<CatalogItem> for CatalogItemResponseDto {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            provider_id: item.provider_id,
            category_id: item.category_id,
            title: item.title,
            description: item.description,
            price: item.price,
            status: item.status,
            created_at: item.created_at,
            updated_at: item.updated_at,
            provider: item.provider,
            category: item.category,
        }
    }
}

/// Sortable columns of the admin listing/service tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSortField {
    Title,
    Price,
    Status,
    CreatedAt,
}

impl LocalRow for CatalogItemResponseDto {
    type Field = CatalogSortField;

    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }

    fn is_inactive(&self) -> bool {
        self.status == CatalogStatus::Inactive
    }

    fn sort_value(&self, field: CatalogSortField, _locale: &str) -> Option<SortValue> {
        match field {
            CatalogSortField::Title => Some(SortValue::Text(self.title.clone())),
            CatalogSortField::Price => self.price.and_then(|p| p.to_f64()).map(SortValue::Number),
            CatalogSortField::Status => Some(SortValue::Text(self.status.to_string())),
            CatalogSortField::CreatedAt => Some(SortValue::Time(self.created_at)),
        }
    }
}

/// Query params for listing catalog items.
///
/// Values stay raw strings here so that malformed numbers and flags are
/// reported as validation errors naming the field. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogQueryParams {
    pub category_id: Option<String>,
    pub provider_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub include_provider: Option<String>,
    pub include_category: Option<String>,
}

fn parse_uuid(field: &str, raw: Option<&str>) -> Result<Option<Uuid>> {
    raw.map(|s| {
        Uuid::parse_str(s.trim())
            .map_err(|_| AppError::Validation(format!("{} must be a valid UUID", field)))
    })
    .transpose()
}

impl TryFrom<CatalogQueryParams> for FilterSpec {
    type Error = AppError;

    fn try_from(params: CatalogQueryParams) -> Result<Self> {
        let status = params
            .status
            .as_deref()
            .map(|s| s.trim().parse::<CatalogStatus>().map_err(AppError::Validation))
            .transpose()?;

        let search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(FilterSpec {
            category_id: parse_uuid("categoryId", params.category_id.as_deref())?,
            provider_id: parse_uuid("providerId", params.provider_id.as_deref())?,
            status,
            search,
            window: PageWindow::from_wire(params.limit.as_deref(), params.offset.as_deref())?,
            expand: Expansion {
                provider: parse_flag("includeProvider", params.include_provider.as_deref())?,
                category: parse_flag("includeCategory", params.include_category.as_deref())?,
            },
        })
    }
}

/// Request DTO for creating a listing or service
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCatalogItemDto {
    pub provider_id: Uuid,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// Defaults to ACTIVE
    pub status: Option<CatalogStatus>,
}

/// Request DTO for a partial update. Absent fields are left untouched;
/// `description: null` and `price: null` clear the value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCatalogItemDto {
    pub provider_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Option<Decimal>>,
    pub status: Option<CatalogStatus>,
}

/// Count/average snapshot over a family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshotDto {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// Mean price over priced items, 0 when none are priced
    pub average_price: f64,
    /// Item count per category id
    pub by_category: BTreeMap<String, i64>,
    /// Item count per provider id
    pub by_provider: BTreeMap<String, i64>,
}

impl From<CatalogAggregates> for StatsSnapshotDto {
    fn from(a: CatalogAggregates) -> Self {
        let average_price = a
            .average_price
            .map(|avg| avg.round_dp(2))
            .and_then(|avg| avg.to_f64())
            .unwrap_or(0.0);

        Self {
            total: a.total,
            active: a.active,
            inactive: a.inactive,
            average_price,
            by_category: a
                .by_category
                .into_iter()
                .map(|(id, count)| (id.to_string(), count))
                .collect(),
            by_provider: a
                .by_provider
                .into_iter()
                .map(|(id, count)| (id.to_string(), count))
                .collect(),
        }
    }
}
