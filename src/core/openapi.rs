use utoipa::{Modify, OpenApi};

use crate::features::catalog::{
    dtos as catalog_dtos, handlers as catalog_handlers, models as catalog_models,
};
use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
};
use crate::shared::types::{ErrorResponse, PageEnvelope, Pagination};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::list_categories,
        categories_handlers::list_categories_paginated,
        categories_handlers::get_category_stats,
        categories_handlers::get_category_by_slug,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::deactivate_category,
        categories_handlers::restore_category,
        categories_handlers::delete_category,
        // Listings / services
        catalog_handlers::create_item,
        catalog_handlers::list_items,
        catalog_handlers::get_stats,
        catalog_handlers::get_item,
        catalog_handlers::update_item,
        catalog_handlers::delete_item,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            Pagination,
            // Categories
            categories_models::CategoryTranslation,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CategoryListDto,
            categories_dtos::TranslationInputDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::CategoryStatsDto,
            PageEnvelope<categories_dtos::CategoryResponseDto>,
            // Listings / services
            catalog_models::CatalogStatus,
            catalog_models::ProviderUser,
            catalog_models::ProviderSummary,
            catalog_models::CategorySummary,
            catalog_dtos::CatalogItemResponseDto,
            catalog_dtos::CreateCatalogItemDto,
            catalog_dtos::UpdateCatalogItemDto,
            catalog_dtos::StatsSnapshotDto,
            PageEnvelope<catalog_dtos::CatalogItemResponseDto>,
        )
    ),
    tags(
        (name = "categories", description = "Catalog categories and their translations"),
        (name = "catalog", description = "Listings and services"),
    ),
    info(
        title = "Marketplace Catalog API",
        version = "0.1.0",
        description = "API documentation for the marketplace catalog",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
