use axum::{routing::get, Router};

pub mod admins;
pub mod branches;
pub mod categories;
pub mod common;
pub mod customers;
pub mod orders;
pub mod products;
pub mod public;
pub mod subcategories;
pub mod system;

/// Every endpoint. Access rules are applied by the auth middleware layered on
/// top in `app::router`.
pub fn router() -> Router {
    let admin = Router::new()
        .merge(admins::router())
        .merge(branches::router())
        .merge(categories::router())
        .merge(subcategories::router())
        .merge(products::router());

    Router::new()
        .route("/", get(system::root))
        .route("/api", get(system::root))
        .route("/api/", get(system::root))
        .nest("/api/admin", admin)
        .nest("/api/auth", customers::auth_router())
        .nest("/api/users", customers::users_router())
        .nest("/api/public", public::router())
        .nest("/api/orders", orders::router())
        .fallback(system::not_found)
}
