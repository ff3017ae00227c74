use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router};

use menuhub_catalog::NewOrder;

use crate::app::dto::JsonBody;
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Mounted under `/api/orders`.
pub fn router() -> Router {
    Router::new().route("/", post(place_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    JsonBody(body): JsonBody<NewOrder>,
) -> Result<axum::response::Response, ServiceError> {
    let customer = principal.and_then(|Extension(ctx)| ctx.principal().customer_id());
    let order = services.orders.place(body, customer).await?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}
