use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use menuhub_catalog::{BranchPatch, NewBranch};
use menuhub_core::BranchId;

use crate::app::dto::JsonBody;
use crate::app::errors::ServiceError;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Mounted under `/api/admin`.
pub fn router() -> Router {
    Router::new()
        .route("/branch", post(create_branch))
        .route("/branch/:id", put(update_branch).delete(delete_branch))
        .route("/branches", get(list_branches))
}

pub async fn create_branch(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<NewBranch>,
) -> Result<axum::response::Response, ServiceError> {
    let branch = services.catalog.create_branch(body).await?;
    Ok((StatusCode::CREATED, Json(branch)).into_response())
}

pub async fn update_branch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<BranchPatch>,
) -> Result<axum::response::Response, ServiceError> {
    let id: BranchId = common::parse_id(&id)?;
    let branch = services.catalog.update_branch(id, body).await?;
    Ok((StatusCode::OK, Json(branch)).into_response())
}

pub async fn delete_branch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: BranchId = common::parse_id(&id)?;
    services.catalog.delete_branch(id).await?;
    Ok((StatusCode::OK, Json(common::message("branch deleted"))).into_response())
}

pub async fn list_branches(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let branches = services.catalog.list_branches().await?;
    Ok((StatusCode::OK, Json(branches)).into_response())
}
