//! Infrastructure layer: record stores, blob storage, outbound email.

pub mod blob;
pub mod notifier;
pub mod store;

pub use blob::{BlobError, BlobStore, FsBlobStore, ImageUpload, InMemoryBlobStore};
pub use notifier::{LogNotifier, Notifier, NotifyError, PromoMessage, SmtpNotifier, SmtpSettings};
pub use store::{
    CatalogStore, CredentialStore, InMemoryStore, OrderStore, PostgresStore, StoreError,
};
