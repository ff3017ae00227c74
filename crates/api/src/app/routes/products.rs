//! Product endpoints. Writes are `multipart/form-data` so an image can ride
//! along with the fields.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use menuhub_core::ProductId;

use crate::app::dto::ProductForm;
use crate::app::errors::ServiceError;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Mounted under `/api/admin`.
pub fn router() -> Router {
    Router::new()
        .route("/product", post(create_product))
        .route(
            "/product/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products", get(list_products))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ProductForm(input): ProductForm,
) -> Result<axum::response::Response, ServiceError> {
    let product = services.products.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ProductForm(input): ProductForm,
) -> Result<axum::response::Response, ServiceError> {
    let id: ProductId = common::parse_id(&id)?;
    let product = services.products.update(id, input).await?;
    Ok((StatusCode::OK, Json(product)).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: ProductId = common::parse_id(&id)?;
    services.products.delete(id).await?;
    Ok((StatusCode::OK, Json(common::message("product deleted"))).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: ProductId = common::parse_id(&id)?;
    let product = services.products.get(id).await?;
    Ok((StatusCode::OK, Json(product)).into_response())
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let products = services.products.list().await?;
    Ok((StatusCode::OK, Json(products)).into_response())
}
