//! Promo-code delivery to a named customer.

use std::sync::Arc;

use menuhub_core::FieldErrors;
use menuhub_infra::{CredentialStore, Notifier, PromoMessage};

use crate::app::dto::{self, PromoRequest};
use crate::app::errors::ServiceError;

pub struct PromoService {
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    span: tracing::Span,
}

impl PromoService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        span: tracing::Span,
    ) -> Self {
        Self {
            credentials,
            notifier,
            span,
        }
    }

    /// Returns the confirmation message on success.
    pub async fn send(&self, request: &PromoRequest) -> Result<String, ServiceError> {
        let mut errors = FieldErrors::new();
        let promo_code = dto::required(&mut errors, "promoCode", request.promo_code.as_deref());
        let username = dto::required(&mut errors, "username", request.username.as_deref());
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }

        let customer = self
            .credentials
            .find_customer_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("customer `{username}` not found")))?;

        let message = PromoMessage {
            to_email: customer.email.clone(),
            to_name: customer.name.clone(),
            promo_code: promo_code.to_string(),
        };
        self.notifier.send_promo(&message).await.map_err(|e| {
            tracing::error!(parent: &self.span, customer_id = %customer.id, error = %e, "promo delivery failed");
            ServiceError::from(e)
        })?;

        tracing::info!(parent: &self.span, customer_id = %customer.id, "promo code sent");
        Ok(format!("promo code {promo_code} sent to {}", customer.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuhub_auth::NewCustomerAccount;
    use menuhub_infra::{InMemoryStore, LogNotifier};

    async fn service() -> (PromoService, Arc<LogNotifier>) {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_customer(NewCustomerAccount {
                username: "a".to_string(),
                password_hash: "x".to_string(),
                name: "Aida".to_string(),
                email: "a@b.com".to_string(),
                phone: "+1".to_string(),
            })
            .await
            .unwrap();
        let notifier = Arc::new(LogNotifier::new(tracing::Span::none()));
        (
            PromoService::new(store, notifier.clone(), tracing::Span::none()),
            notifier,
        )
    }

    fn request(code: &str, username: &str) -> PromoRequest {
        PromoRequest {
            promo_code: Some(code.to_string()),
            username: Some(username.to_string()),
        }
    }

    #[tokio::test]
    async fn sends_to_the_customer_email() {
        let (service, notifier) = service().await;
        let message = service.send(&request("SAVE10", "a")).await.unwrap();
        assert_eq!(message, "promo code SAVE10 sent to a@b.com");

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_name, "Aida");
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let (service, notifier) = service().await;
        let err = service.send(&request("SAVE10", "nobody")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_is_internal() {
        let (service, notifier) = service().await;
        notifier.fail_with(Some("smtp down"));
        let err = service.send(&request("SAVE10", "a")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(ref msg) if msg.contains("smtp down")));
    }

    #[tokio::test]
    async fn both_fields_are_required() {
        let (service, _) = service().await;
        let err = service.send(&PromoRequest::default()).await.unwrap_err();
        match err {
            ServiceError::InvalidFields { errors, .. } => {
                assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["promoCode", "username"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
