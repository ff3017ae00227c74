use std::sync::Arc;

use axum::{
    extract::State,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use menuhub_auth::{AuthGate, GateOutcome};

use crate::app::errors::ServiceError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<AuthGate>,
}

/// Runs every request through the gate and attaches the principal, if any.
pub async fn auth_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let outcome = state
        .gate
        .evaluate(req.method().as_str(), req.uri().path(), authorization);

    match outcome {
        Ok(GateOutcome::Authenticated(principal)) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
        }
        Ok(GateOutcome::Anonymous) => {}
        Err(rejection) => return ServiceError::from(rejection).into_response(),
    }

    next.run(req).await
}
