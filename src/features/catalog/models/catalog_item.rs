use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::categories::models::CategoryTranslation;

/// The two structurally identical catalog entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Listing,
    Service,
}

impl ResourceFamily {
    /// Table name, also used as the URL segment and the cache tag.
    pub fn table(self) -> &'static str {
        match self {
            ResourceFamily::Listing => "listings",
            ResourceFamily::Service => "services",
        }
    }

    pub fn cache_tag(self) -> &'static str {
        self.table()
    }

    /// Singular name used in user-facing messages
    pub fn label(self) -> &'static str {
        match self {
            ResourceFamily::Listing => "Listing",
            ResourceFamily::Service => "Service",
        }
    }
}

/// Catalog item status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "catalog_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for CatalogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogStatus::Active => write!(f, "ACTIVE"),
            CatalogStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

impl FromStr for CatalogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CatalogStatus::Active),
            "INACTIVE" => Ok(CatalogStatus::Inactive),
            other => Err(format!("status must be ACTIVE or INACTIVE, got '{}'", other)),
        }
    }
}

/// User behind a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Provider attached to an item when `includeProvider` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: Uuid,
    pub user: ProviderUser,
}

/// Provider joined with its user
#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
}

impl From<ProviderRow> for ProviderSummary {
    fn from(r: ProviderRow) -> Self {
        Self {
            id: r.id,
            user: ProviderUser {
                id: r.user_id,
                name: r.user_name,
                email: r.user_email,
            },
        }
    }
}

/// Category attached to an item when `includeCategory` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: Uuid,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub active: bool,
    pub translations: Vec<CategoryTranslation>,
}

/// Database row for a listing or service
#[derive(Debug, Clone, FromRow)]
pub struct CatalogItemRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing or service, with relations attached only when expanded
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub provider: Option<ProviderSummary>,
    pub category: Option<CategorySummary>,
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(r: CatalogItemRow) -> Self {
        Self {
            id: r.id,
            provider_id: r.provider_id,
            category_id: r.category_id,
            title: r.title,
            description: r.description,
            price: r.price,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            provider: None,
            category: None,
        }
    }
}

/// Validated data for a new item
#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub status: CatalogStatus,
}

/// Partial update. `None` leaves a column untouched; for the nullable
/// columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct CatalogItemChanges {
    pub provider_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Option<Decimal>>,
    pub status: Option<CatalogStatus>,
}

/// Raw aggregates over one family, before shaping into the stats response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogAggregates {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// Mean over priced items; `None` when no item has a price
    pub average_price: Option<Decimal>,
    pub by_category: Vec<(Uuid, i64)>,
    pub by_provider: Vec<(Uuid, i64)>,
}
