//! Storefront accounts (`/api/auth/*`) and their admin management (`/api/users*`).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use menuhub_core::CustomerId;

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ServiceError;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::RequireAdmin;

/// Mounted under `/api/auth`.
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register).get(register_info))
        .route("/login", post(login).get(login_info))
}

/// Mounted under `/api/users`.
pub fn users_router() -> Router {
    Router::new()
        .route("/", get(list_customers))
        .route("/promo", post(send_promo))
        .route("/:id", delete(delete_customer))
}

pub async fn register_info() -> impl IntoResponse {
    Json(json!({
        "message": "This endpoint registers a customer. Use POST to register.",
        "required_fields": ["email", "phone", "password"],
    }))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::CustomerRegisterRequest>,
) -> Result<axum::response::Response, ServiceError> {
    let customer = services.accounts.register_customer(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "registration successful",
            "name": customer.name,
        })),
    )
        .into_response())
}

pub async fn login_info() -> impl IntoResponse {
    Json(json!({
        "message": "This endpoint signs a customer in. Use POST to sign in.",
        "required_fields": ["email", "password"],
    }))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::CustomerLoginRequest>,
) -> Result<axum::response::Response, ServiceError> {
    let signed_in = services.accounts.login_customer(&body).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "login successful",
            "name": signed_in.name,
            "token": signed_in.token,
        })),
    )
        .into_response())
}

pub async fn list_customers(
    _admin: RequireAdmin,
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let customers = services.accounts.list_customers().await?;
    Ok((StatusCode::OK, Json(customers)).into_response())
}

pub async fn delete_customer(
    RequireAdmin(admin): RequireAdmin,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ServiceError> {
    let id: CustomerId = common::parse_id(&id)?;
    services.accounts.delete_customer(id).await?;
    tracing::info!(admin_id = %admin, customer_id = %id, "customer removed by admin");
    Ok((StatusCode::OK, Json(common::message("customer deleted"))).into_response())
}

pub async fn send_promo(
    _admin: RequireAdmin,
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::PromoRequest>,
) -> Result<axum::response::Response, ServiceError> {
    let message = services.promo.send(&body).await?;
    Ok((StatusCode::OK, Json(common::message(message))).into_response())
}
