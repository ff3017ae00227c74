//! HTTP application wiring (axum router + service wiring).
//!
//! - `services/`: business operations over the stores, blob store and notifier
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request bodies and multipart parsing
//! - `errors.rs`: `ServiceError` and consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;

use menuhub_auth::{AccessPolicy, AuthGate, Hs256TokenCodec, TokenCodec};
use menuhub_infra::{
    BlobStore, CatalogStore, CredentialStore, FsBlobStore, InMemoryStore, LogNotifier, Notifier,
    OrderStore, PostgresStore, SmtpNotifier,
};
use menuhub_observability::component_span;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, Backends};

/// Room for a maximum-size image plus the other form fields.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Router over already-built services. Tests use this directly with in-memory
/// backends.
pub fn router(services: Arc<AppServices>) -> Router {
    let gate = AuthGate::new(
        services.tokens.clone(),
        AccessPolicy::default(),
        component_span("auth_gate"),
    );
    let gate_state = middleware::GateState {
        gate: Arc::new(gate),
    };

    routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                gate_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(services))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    )
}

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(AppServices::new(build_backends(config).await?));

    if config.bootstrap_admin {
        if let Some(credentials) = services.accounts.bootstrap_admin().await? {
            // Only delivery channel for the first admin's password.
            tracing::warn!(
                username = %credentials.username,
                password = %credentials.password,
                "no admin accounts found; created bootstrap admin"
            );
        }
    }

    Ok(router(services))
}

pub async fn build_backends(config: &AppConfig) -> anyhow::Result<Backends> {
    let tokens: Arc<dyn TokenCodec> =
        Arc::new(Hs256TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl));

    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(
        config.media_root.clone(),
        config.media_url.clone(),
        component_span("blob_store"),
    ));

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(settings) => {
            tracing::info!(host = %settings.host, port = settings.port, "promo email via SMTP");
            Arc::new(SmtpNotifier::new(settings, component_span("notifier"))?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set; promo emails are logged, not sent");
            Arc::new(LogNotifier::new(component_span("notifier")))
        }
    };

    let backends = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            store.migrate().await?;
            tracing::info!("using postgres store");
            with_store(Arc::new(store), blobs, notifier, tokens, config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
            with_store(Arc::new(InMemoryStore::new()), blobs, notifier, tokens, config)
        }
    };

    Ok(backends)
}

fn with_store<S>(
    store: Arc<S>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    tokens: Arc<dyn TokenCodec>,
    config: &AppConfig,
) -> Backends
where
    S: CredentialStore + CatalogStore + OrderStore + 'static,
{
    Backends {
        credentials: store.clone(),
        catalog: store.clone(),
        orders: store,
        blobs,
        notifier,
        tokens,
        pricing: config.pricing_rules(),
    }
}
