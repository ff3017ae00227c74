use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use menuhub_catalog::{NewSubcategory, SubcategoryPatch};
use menuhub_core::SubcategoryId;

use crate::app::dto::JsonBody;
use crate::app::errors::ServiceError;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Mounted under `/api/admin`.
pub fn router() -> Router {
    Router::new()
        .route("/subcategory", post(create_subcategory))
        .route(
            "/subcategory/:id",
            get(get_subcategory).put(update_subcategory).delete(delete_subcategory),
        )
        .route("/subcategories", get(list_subcategories))
}

pub async fn create_subcategory(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<NewSubcategory>,
) -> Result<axum::response::Response, ServiceError> {
    let subcategory = services.catalog.create_subcategory(body).await?;
    Ok((StatusCode::CREATED, Json(subcategory)).into_response())
}

pub async fn get_subcategory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: SubcategoryId = common::parse_id(&id)?;
    let subcategory = services.catalog.get_subcategory(id).await?;
    Ok((StatusCode::OK, Json(subcategory)).into_response())
}

pub async fn update_subcategory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SubcategoryPatch>,
) -> Result<axum::response::Response, ServiceError> {
    let id: SubcategoryId = common::parse_id(&id)?;
    let subcategory = services.catalog.update_subcategory(id, body).await?;
    Ok((StatusCode::OK, Json(subcategory)).into_response())
}

pub async fn delete_subcategory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: SubcategoryId = common::parse_id(&id)?;
    services.catalog.delete_subcategory(id).await?;
    Ok((StatusCode::OK, Json(common::message("subcategory deleted"))).into_response())
}

pub async fn list_subcategories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let subcategories = services.catalog.list_subcategories().await?;
    Ok((StatusCode::OK, Json(subcategories)).into_response())
}
