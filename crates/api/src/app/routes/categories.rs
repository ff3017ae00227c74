use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use menuhub_catalog::{CategoryPatch, NewCategory};
use menuhub_core::CategoryId;

use crate::app::dto::JsonBody;
use crate::app::errors::ServiceError;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Mounted under `/api/admin`.
pub fn router() -> Router {
    Router::new()
        .route("/category", post(create_category))
        .route("/category/:id", put(update_category).delete(delete_category))
        .route("/categories", get(list_categories))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<NewCategory>,
) -> Result<axum::response::Response, ServiceError> {
    let category = services.catalog.create_category(body).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CategoryPatch>,
) -> Result<axum::response::Response, ServiceError> {
    let id: CategoryId = common::parse_id(&id)?;
    let category = services.catalog.update_category(id, body).await?;
    Ok((StatusCode::OK, Json(category)).into_response())
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: CategoryId = common::parse_id(&id)?;
    services.catalog.delete_category(id).await?;
    Ok((StatusCode::OK, Json(common::message("category deleted"))).into_response())
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let categories = services.catalog.list_categories().await?;
    Ok((StatusCode::OK, Json(categories)).into_response())
}
