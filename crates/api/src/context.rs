use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use menuhub_auth::Principal;
use menuhub_core::AdminId;

use crate::app::errors::ServiceError;

/// Authenticated identity attached by the auth middleware.
///
/// Absent on anonymous requests (public paths, or best-effort paths without a
/// usable token).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }
}

/// Extractor for handlers outside the admin namespace that still need an admin.
///
/// No principal → 401, customer principal → 403.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequireAdmin(pub AdminId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(context) = parts.extensions.get::<PrincipalContext>() else {
            return Err(ServiceError::AuthenticationRequired(
                "authentication credentials were not provided".to_string(),
            ));
        };

        context
            .principal()
            .admin_id()
            .map(RequireAdmin)
            .ok_or_else(|| ServiceError::Forbidden("administrator access required".to_string()))
    }
}
