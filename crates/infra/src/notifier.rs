//! Outbound promo-code email.

use std::sync::Mutex;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// A promo code addressed to one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoMessage {
    pub to_email: String,
    pub to_name: String,
    pub promo_code: String,
}

impl PromoMessage {
    pub fn subject(&self) -> &'static str {
        "Your promo code"
    }

    pub fn body(&self) -> String {
        format!(
            "Hello, {}!\n\nYour promo code: {}\n\nBest regards,\nThe MenuHub team",
            self.to_name, self.promo_code
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_promo(&self, message: &PromoMessage) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

/// Sends mail through an SMTP relay (STARTTLS).
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    span: tracing::Span,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings, span: tracing::Span) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address: settings.from_address.clone(),
            span,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_promo(&self, message: &PromoMessage) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(message
                .to_email
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(message.to_email.clone()))?)
            .subject(message.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body())?;

        self.mailer.send(email).await?;

        tracing::info!(parent: &self.span, to = %message.to_email, "promo email sent");
        Ok(())
    }
}

/// Logs instead of sending. Used when no SMTP relay is configured, and in tests.
#[derive(Debug)]
pub struct LogNotifier {
    sent: Mutex<Vec<PromoMessage>>,
    fail_with: Mutex<Option<String>>,
    span: tracing::Span,
}

impl LogNotifier {
    pub fn new(span: tracing::Span) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            span,
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<PromoMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Make every following send fail with `reason` (`None` restores success).
    pub fn fail_with(&self, reason: Option<&str>) {
        if let Ok(mut slot) = self.fail_with.lock() {
            *slot = reason.map(str::to_string);
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_promo(&self, message: &PromoMessage) -> Result<(), NotifyError> {
        let failure = self.fail_with.lock().ok().and_then(|f| f.clone());
        if let Some(reason) = failure {
            tracing::warn!(parent: &self.span, to = %message.to_email, %reason, "promo email failed");
            return Err(NotifyError::Unavailable(reason));
        }

        tracing::info!(
            parent: &self.span,
            to = %message.to_email,
            promo_code = %message.promo_code,
            "promo email (log only, no SMTP relay configured)"
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> PromoMessage {
        PromoMessage {
            to_email: "a@b.com".into(),
            to_name: "Aida".into(),
            promo_code: "PIZZA10".into(),
        }
    }

    #[test]
    fn body_greets_and_carries_code() {
        let body = message().body();
        assert!(body.starts_with("Hello, Aida!"));
        assert!(body.contains("PIZZA10"));
    }

    #[tokio::test]
    async fn log_notifier_records_and_fails_on_demand() {
        let notifier = LogNotifier::new(tracing::Span::none());
        notifier.send_promo(&message()).await.unwrap();
        assert_eq!(notifier.sent(), vec![message()]);

        notifier.fail_with(Some("relay down"));
        let err = notifier.send_promo(&message()).await.unwrap_err();
        assert_eq!(err.to_string(), "notifier unavailable: relay down");
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn smtp_notifier_builds_without_connecting() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: Some("mailer".into()),
            password: Some("secret".into()),
            from_address: "MenuHub <noreply@example.com>".into(),
        };
        assert!(SmtpNotifier::new(&settings, tracing::Span::none()).is_ok());
    }
}
