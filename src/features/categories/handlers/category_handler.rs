use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::categories::dtos::{
    CategoryListDto, CategoryResponseDto, CategoryStatsDto, CreateCategoryDto,
    ListCategoriesQuery, PaginatedCategoriesQuery, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ErrorResponse, PageEnvelope, PageWindow};
use crate::shared::validation::parse_flag;

/// List categories
///
/// Returns a flat list, or a tree when `includeChildren` is set.
/// Inactive categories are left out unless `includeInactive` is set.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(
        ("includeInactive" = Option<bool>, Query, description = "Include inactive categories"),
        ("includeChildren" = Option<bool>, Query, description = "Return a tree with nested children")
    ),
    responses(
        (status = 200, description = "List of categories", body = CategoryListDto),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<ListCategoriesQuery>,
) -> Result<Json<CategoryListDto>> {
    let include_inactive = parse_flag("includeInactive", query.include_inactive.as_deref())?;
    let include_children = parse_flag("includeChildren", query.include_children.as_deref())?;

    let categories = service.list(include_inactive, include_children).await?;
    Ok(Json(categories))
}

/// List categories one page at a time
#[utoipa::path(
    get,
    path = "/api/categories/paginated",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (default 10)"),
        ("offset" = Option<i64>, Query, description = "Rows to skip (default 0)"),
        ("includeInactive" = Option<bool>, Query, description = "Include inactive categories")
    ),
    responses(
        (status = 200, description = "Page of categories", body = PageEnvelope<CategoryResponseDto>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn list_categories_paginated(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<PaginatedCategoriesQuery>,
) -> Result<Json<PageEnvelope<CategoryResponseDto>>> {
    let window = PageWindow::from_wire(query.limit.as_deref(), query.offset.as_deref())?;
    let include_inactive = parse_flag("includeInactive", query.include_inactive.as_deref())?;

    let page = service.list_paginated(window, include_inactive).await?;
    Ok(Json(page))
}

/// Category counts
#[utoipa::path(
    get,
    path = "/api/categories/stats",
    responses(
        (status = 200, description = "Category statistics", body = CategoryStatsDto)
    ),
    tag = "categories"
)]
pub async fn get_category_stats(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<CategoryStatsDto>> {
    let stats = service.stats().await?;
    Ok(Json(stats))
}

/// Get an active category by slug
#[utoipa::path(
    get,
    path = "/api/categories/slug/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryResponseDto),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category_by_slug(
    State(service): State<Arc<CategoryService>>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<CategoryResponseDto>> {
    let category = service.get_by_slug(&slug).await?;
    Ok(Json(category))
}

/// Get a category by ID, active or not
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryResponseDto),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<CategoryResponseDto>> {
    let category = service.get_by_id(id).await?;
    Ok(Json(category))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = CategoryResponseDto),
        (status = 400, description = "Validation error or unknown parent", body = ErrorResponse),
        (status = 409, description = "Slug already in use", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<CategoryResponseDto>)> {
    let category = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category
///
/// Only supplied fields change. `parentId: null` moves the category to the root.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponseDto),
        (status = 400, description = "Validation error, unknown parent or cycle", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Slug already in use", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<CategoryResponseDto>> {
    let category = service.update(id, dto).await?;
    Ok(Json(category))
}

/// Soft delete a category (mark it inactive)
#[utoipa::path(
    post,
    path = "/api/categories/{id}/deactivate",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category is inactive", body = CategoryResponseDto),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn deactivate_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<CategoryResponseDto>> {
    let category = service.deactivate(id).await?;
    Ok(Json(category))
}

/// Restore a soft-deleted category
#[utoipa::path(
    post,
    path = "/api/categories/{id}/restore",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category is active", body = CategoryResponseDto),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn restore_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<CategoryResponseDto>> {
    let category = service.restore(id).await?;
    Ok(Json(category))
}

/// Permanently delete a category
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still has children or catalog items", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    service.hard_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
