//! Unauthenticated storefront reads.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::app::errors::ServiceError;
use crate::app::services::AppServices;

/// Mounted under `/api/public`.
pub fn router() -> Router {
    Router::new()
        .route("/branches", get(branches))
        .route("/categories", get(categories))
        .route("/products", get(products))
}

pub async fn branches(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    Ok((StatusCode::OK, Json(services.catalog.list_branches().await?)).into_response())
}

pub async fn categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    Ok((StatusCode::OK, Json(services.catalog.list_categories().await?)).into_response())
}

pub async fn products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    Ok((StatusCode::OK, Json(services.products.list().await?)).into_response())
}
