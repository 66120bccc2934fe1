//! Handlers shared by `/api/listings` and `/api/services`. The router binds
//! one [`CatalogService`] per family as state.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::catalog::dtos::{
    CatalogItemResponseDto, CatalogQueryParams, CreateCatalogItemDto, StatsSnapshotDto,
    UpdateCatalogItemDto,
};
use crate::features::catalog::models::FilterSpec;
use crate::features::catalog::services::CatalogService;
use crate::shared::types::{ErrorResponse, PageEnvelope};

/// Create a listing or service
#[utoipa::path(
    post,
    path = "/api/{resource}",
    params(
        ("resource" = String, Path, description = "`listings` or `services`")
    ),
    request_body = CreateCatalogItemDto,
    responses(
        (status = 201, description = "Item created with provider and category attached", body = CatalogItemResponseDto),
        (status = 400, description = "Validation error or unknown providerId/categoryId", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_item(
    State(service): State<Arc<CatalogService>>,
    AppJson(dto): AppJson<CreateCatalogItemDto>,
) -> Result<(StatusCode, Json<CatalogItemResponseDto>)> {
    let item = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List listings or services, newest first
#[utoipa::path(
    get,
    path = "/api/{resource}",
    params(
        ("resource" = String, Path, description = "`listings` or `services`"),
        ("categoryId" = Option<Uuid>, Query, description = "Only items in this category"),
        ("providerId" = Option<Uuid>, Query, description = "Only items of this provider"),
        ("status" = Option<String>, Query, description = "ACTIVE or INACTIVE"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title or description"),
        ("limit" = Option<i64>, Query, description = "Page size (default 10)"),
        ("offset" = Option<i64>, Query, description = "Rows to skip (default 0)"),
        ("includeProvider" = Option<bool>, Query, description = "Attach provider with its user"),
        ("includeCategory" = Option<bool>, Query, description = "Attach category with its translations")
    ),
    responses(
        (status = 200, description = "Page of items", body = PageEnvelope<CatalogItemResponseDto>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_items(
    State(service): State<Arc<CatalogService>>,
    AppQuery(params): AppQuery<CatalogQueryParams>,
) -> Result<Json<PageEnvelope<CatalogItemResponseDto>>> {
    let filter = FilterSpec::try_from(params)?;
    let page = service.list(filter).await?;
    Ok(Json(page))
}

/// Counts, average price and breakdowns by category and provider
#[utoipa::path(
    get,
    path = "/api/{resource}/stats",
    params(
        ("resource" = String, Path, description = "`listings` or `services`")
    ),
    responses(
        (status = 200, description = "Statistics snapshot", body = StatsSnapshotDto)
    ),
    tag = "catalog"
)]
pub async fn get_stats(
    State(service): State<Arc<CatalogService>>,
) -> Result<Json<StatsSnapshotDto>> {
    let stats = service.stats().await?;
    Ok(Json(stats))
}

/// Get one item with provider and category attached
#[utoipa::path(
    get,
    path = "/api/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "`listings` or `services`"),
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = CatalogItemResponseDto),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_item(
    State(service): State<Arc<CatalogService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<CatalogItemResponseDto>> {
    let item = service.get_by_id(id).await?;
    Ok(Json(item))
}

/// Partially update an item
#[utoipa::path(
    put,
    path = "/api/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "`listings` or `services`"),
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = UpdateCatalogItemDto,
    responses(
        (status = 200, description = "Item updated", body = CatalogItemResponseDto),
        (status = 400, description = "Validation error or unknown providerId/categoryId", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn update_item(
    State(service): State<Arc<CatalogService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateCatalogItemDto>,
) -> Result<Json<CatalogItemResponseDto>> {
    let item = service.update(id, dto).await?;
    Ok(Json(item))
}

/// Delete an item permanently
#[utoipa::path(
    delete,
    path = "/api/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "`listings` or `services`"),
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_item(
    State(service): State<Arc<CatalogService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
