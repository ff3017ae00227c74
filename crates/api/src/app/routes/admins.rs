//! Admin accounts, staff listing, promo codes and the order log.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ServiceError;
use crate::app::routes::{common, system};
use crate::app::services::AppServices;

/// Mounted under `/api/admin`.
pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login).get(login_get))
        .route("/users", get(list_staff))
        .route("/promo", post(send_promo))
        .route("/orders", get(list_orders))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let credentials = services.accounts.register_admin().await?;
    Ok((StatusCode::OK, Json(credentials)).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::AdminLoginRequest>,
) -> Result<axum::response::Response, ServiceError> {
    let signed_in = services.accounts.login_admin(&body).await?;
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

pub async fn login_get() -> ServiceError {
    system::method_not_allowed("use POST to sign in")
}

pub async fn list_staff(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let users = services
        .accounts
        .list_staff_usernames()
        .await?
        .into_iter()
        .map(|username| json!({ "username": username }))
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(users)).into_response())
}

pub async fn send_promo(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::PromoRequest>,
) -> Result<axum::response::Response, ServiceError> {
    let message = services.promo.send(&body).await?;
    Ok((StatusCode::OK, Json(common::message(message))).into_response())
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ServiceError> {
    let orders = services.orders.list().await?;
    Ok((StatusCode::OK, Json(orders)).into_response())
}
