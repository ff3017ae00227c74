//! Request gate: which requests need a token, and what the token must say.
//!
//! Three tiers, evaluated in order:
//! 1. explicit public paths skip token processing entirely;
//! 2. the admin namespace requires a valid token, and an admin one for
//!    mutating methods (product reads excepted);
//! 3. everything else treats the token as optional and best-effort.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::{Principal, TokenCodec};

/// Which tier of the policy a request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    /// Allow-listed path; no token processing.
    Public,
    /// Read of the admin product listing/detail; no token processing.
    AdminPublicRead,
    /// Admin namespace; token required.
    AdminGated,
    /// Anything else; token optional.
    BestEffort,
}

/// Path classification table.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public_paths: HashSet<String>,
    admin_prefix: String,
    admin_product_listing: String,
    admin_product_prefix: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let public_paths = [
            "/",
            "/api",
            "/api/",
            "/api/admin/register",
            "/api/admin/login",
            "/api/auth/register",
            "/api/auth/login",
            "/api/public/branches",
            "/api/public/categories",
            "/api/public/products",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            public_paths,
            admin_prefix: "/api/admin/".to_string(),
            admin_product_listing: "/api/admin/products".to_string(),
            admin_product_prefix: "/api/admin/product".to_string(),
        }
    }
}

impl AccessPolicy {
    pub fn classify(&self, method: &str, path: &str) -> AccessTier {
        if self.public_paths.contains(path) {
            return AccessTier::Public;
        }

        if path.starts_with(&self.admin_prefix) {
            let product_read = path == self.admin_product_listing
                || path.starts_with(&self.admin_product_prefix);
            if product_read && method.eq_ignore_ascii_case("GET") {
                return AccessTier::AdminPublicRead;
            }
            return AccessTier::AdminGated;
        }

        AccessTier::BestEffort
    }
}

/// Result of a successful gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Anonymous,
    Authenticated(Principal),
}

impl GateOutcome {
    pub fn principal(&self) -> Option<Principal> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(p) => Some(*p),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateRejection {
    #[error("authentication required: expected \"Authorization: Bearer <token>\"")]
    AuthenticationRequired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("only administrators may modify this resource")]
    Forbidden,
}

/// Evaluates the access policy for one request.
pub struct AuthGate {
    policy: AccessPolicy,
    codec: Arc<dyn TokenCodec>,
    span: tracing::Span,
}

impl AuthGate {
    pub fn new(codec: Arc<dyn TokenCodec>, policy: AccessPolicy, span: tracing::Span) -> Self {
        Self {
            policy,
            codec,
            span,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// `authorization` is the raw `Authorization` header value, if any.
    pub fn evaluate(
        &self,
        method: &str,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<GateOutcome, GateRejection> {
        match self.policy.classify(method, path) {
            AccessTier::Public => {
                tracing::debug!(parent: &self.span, %method, %path, "public path, skipping token check");
                Ok(GateOutcome::Anonymous)
            }
            AccessTier::AdminPublicRead => {
                tracing::debug!(parent: &self.span, %method, %path, "admin product read, no token required");
                Ok(GateOutcome::Anonymous)
            }
            AccessTier::AdminGated => self.admin_gated(method, path, authorization),
            AccessTier::BestEffort => Ok(self.best_effort(path, authorization)),
        }
    }

    fn admin_gated(
        &self,
        method: &str,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<GateOutcome, GateRejection> {
        let Some(token) = bearer_token(authorization) else {
            tracing::warn!(parent: &self.span, %method, %path, "token missing or malformed header");
            return Err(GateRejection::AuthenticationRequired);
        };

        let claims = self.codec.decode(token).map_err(|e| {
            tracing::warn!(parent: &self.span, %method, %path, error = %e, "token rejected");
            GateRejection::InvalidToken(e.to_string())
        })?;
        let principal = claims.principal();

        if is_mutating(method) && !principal.is_admin() {
            tracing::warn!(parent: &self.span, %method, %path, %principal, "non-admin attempted admin write");
            return Err(GateRejection::Forbidden);
        }

        tracing::debug!(parent: &self.span, %method, %path, %principal, "admin namespace access granted");
        Ok(GateOutcome::Authenticated(principal))
    }

    fn best_effort(&self, path: &str, authorization: Option<&str>) -> GateOutcome {
        let Some(token) = bearer_token(authorization) else {
            return GateOutcome::Anonymous;
        };

        match self.codec.decode(token) {
            Ok(claims) => GateOutcome::Authenticated(claims.principal()),
            Err(e) => {
                tracing::info!(parent: &self.span, %path, error = %e, "ignoring unusable optional token");
                GateOutcome::Anonymous
            }
        }
    }
}

fn is_mutating(method: &str) -> bool {
    ["POST", "PUT", "PATCH", "DELETE"]
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
