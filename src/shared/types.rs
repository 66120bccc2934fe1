use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{DEFAULT_LIMIT, DEFAULT_OFFSET};
use crate::shared::validation::parse_non_negative;

/// Body returned for every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(message: String, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message: Some(message),
            errors,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// A validated limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl PageWindow {
    pub fn new(limit: i64, offset: i64) -> Result<Self> {
        if limit <= 0 {
            return Err(AppError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }
        if offset < 0 {
            return Err(AppError::Validation(
                "offset must be a non-negative integer".to_string(),
            ));
        }
        Ok(Self { limit, offset })
    }

    /// Coerce the raw query-string values. Absent values take the defaults;
    /// malformed or negative values are rejected rather than clamped.
    pub fn from_wire(limit: Option<&str>, offset: Option<&str>) -> Result<Self> {
        let limit = match limit {
            Some(raw) => parse_non_negative("limit", raw)?,
            None => DEFAULT_LIMIT,
        };
        let offset = match offset {
            Some(raw) => parse_non_negative("offset", raw)?,
            None => DEFAULT_OFFSET,
        };
        Self::new(limit, offset)
    }
}

/// Navigation metadata for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Derive page metadata from a total count and the requested window.
    ///
    /// `limit` must be positive; `total` and `offset` must be non-negative.
    pub fn compute(total: i64, limit: i64, offset: i64) -> Result<Self> {
        if total < 0 {
            return Err(AppError::Validation(
                "total must be a non-negative integer".to_string(),
            ));
        }
        let window = PageWindow::new(limit, offset)?;
        Ok(Self::for_window(total, window))
    }

    /// Any positive `limit` and non-negative `offset` up to `i64::MAX`
    /// is accepted without overflow.
    pub fn for_window(total: i64, window: PageWindow) -> Self {
        let PageWindow { limit, offset } = window;
        let remainder_page = if total % limit == 0 { 0 } else { 1 };
        Self {
            total,
            page: (offset / limit).saturating_add(1),
            limit,
            total_pages: total / limit + remainder_page,
            has_next: offset.saturating_add(limit) < total,
            has_prev: offset > 0,
        }
    }
}

/// One page of results plus its pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageEnvelope<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PageEnvelope<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self { data, pagination }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageEnvelope<U> {
        PageEnvelope {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

// =============================================================================
// PARTIAL UPDATES
// =============================================================================

/// Deserializer for `Option<Option<T>>` fields of update payloads.
///
/// Used with `#[serde(default)]`: an absent key stays `None`, an explicit
/// `null` becomes `Some(None)` (clear the column).
pub fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
