//! Application services: the layer between HTTP handlers and the stores.
//!
//! Each service owns the collaborators it needs and a component span; handlers
//! reach them through `Extension<Arc<AppServices>>`.

use std::sync::Arc;

use menuhub_auth::TokenCodec;
use menuhub_catalog::PricingRules;
use menuhub_infra::{BlobStore, CatalogStore, CredentialStore, Notifier, OrderStore};
use menuhub_observability::component_span;

pub mod accounts;
pub mod catalog;
pub mod orders;
pub mod products;
pub mod promo;

pub use accounts::{AccountService, SignedIn};
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use products::{ProductInput, ProductService, ProductView};
pub use promo::PromoService;

/// Everything the services are built from.
#[derive(Clone)]
pub struct Backends {
    pub credentials: Arc<dyn CredentialStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub tokens: Arc<dyn TokenCodec>,
    pub pricing: PricingRules,
}

pub struct AppServices {
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub products: ProductService,
    pub promo: PromoService,
    pub orders: OrderService,
    pub tokens: Arc<dyn TokenCodec>,
}

impl AppServices {
    pub fn new(backends: Backends) -> Self {
        let Backends {
            credentials,
            catalog,
            orders,
            blobs,
            notifier,
            tokens,
            pricing,
        } = backends;

        Self {
            accounts: AccountService::new(
                credentials.clone(),
                tokens.clone(),
                component_span("accounts"),
            ),
            catalog: CatalogService::new(catalog.clone(), component_span("catalog")),
            products: ProductService::new(catalog, blobs, pricing, component_span("products")),
            promo: PromoService::new(credentials, notifier, component_span("promo")),
            orders: OrderService::new(orders, component_span("orders")),
            tokens,
        }
    }
}
