use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::catalog::handlers;
use crate::features::catalog::models::ResourceFamily;
use crate::features::catalog::services::CatalogService;

/// Create routes for one catalog family under `/api/{listings|services}`
pub fn routes(family: ResourceFamily, service: Arc<CatalogService>) -> Router {
    let base = format!("/api/{}", family.table());

    Router::new()
        .route(
            &base,
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(&format!("{base}/stats"), get(handlers::get_stats))
        .route(
            &format!("{base}/{{id}}"),
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .with_state(service)
}
