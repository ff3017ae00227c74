use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::errors::{self, ServiceError};

/// Service banner plus a map of every endpoint.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the MenuHub API",
        "available_endpoints": {
            "admin": {
                "register": "/api/admin/register",
                "login": "/api/admin/login",
                "users": "/api/admin/users",
                "promo": "/api/admin/promo",
                "branch": "/api/admin/branch",
                "branches": "/api/admin/branches",
                "category": "/api/admin/category",
                "categories": "/api/admin/categories",
                "subcategory": "/api/admin/subcategory",
                "subcategories": "/api/admin/subcategories",
                "product": "/api/admin/product",
                "products": "/api/admin/products",
                "orders": "/api/admin/orders",
            },
            "auth": {
                "register": "/api/auth/register",
                "login": "/api/auth/login",
            },
            "users": {
                "list": "/api/users",
                "delete": "/api/users/{id}",
                "promo": "/api/users/promo",
            },
            "public": {
                "branches": "/api/public/branches",
                "categories": "/api/public/categories",
                "products": "/api/public/products",
            },
            "orders": "/api/orders",
        }
    }))
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such endpoint")
}

pub fn method_not_allowed(hint: &str) -> ServiceError {
    ServiceError::MethodNotAllowed(format!("method not allowed here; {hint}"))
}
