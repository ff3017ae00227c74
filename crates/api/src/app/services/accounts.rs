//! Admin and customer accounts: registration, sign-in, listing.

use std::sync::Arc;

use menuhub_auth::{
    AdminAccount, CustomerAccount, GeneratedCredentials, NewAdminAccount, NewCustomerAccount,
    Principal, TokenCodec, generate_admin_credentials, hash_password, username_from_email,
    verify_password,
};
use menuhub_core::{CustomerId, FieldErrors};
use menuhub_infra::{CredentialStore, StoreError};

use crate::app::dto::{self, AdminLoginRequest, CustomerLoginRequest, CustomerRegisterRequest};
use crate::app::errors::ServiceError;

const EMAIL_MAX: usize = 254;
const PHONE_MAX: usize = 20;
const NAME_MAX: usize = 100;

/// Display name plus a freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub name: String,
    pub token: String,
}

pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    tokens: Arc<dyn TokenCodec>,
    span: tracing::Span,
}

impl AccountService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<dyn TokenCodec>,
        span: tracing::Span,
    ) -> Self {
        Self {
            credentials,
            tokens,
            span,
        }
    }

    /// Generate, hash and store a new staff superuser. The plaintext password
    /// only ever exists in the returned value.
    pub async fn register_admin(&self) -> Result<GeneratedCredentials, ServiceError> {
        let credentials = generate_admin_credentials();
        let account = NewAdminAccount {
            username: credentials.username.clone(),
            password_hash: hash_password(&credentials.password)?,
            is_staff: true,
            is_superuser: true,
        };

        let stored = self.credentials.insert_admin(account).await?;
        tracing::info!(parent: &self.span, admin_id = %stored.id, username = %stored.username, "admin registered");
        Ok(credentials)
    }

    /// Create the first admin when none exist yet.
    pub async fn bootstrap_admin(&self) -> Result<Option<GeneratedCredentials>, ServiceError> {
        if self.credentials.count_admins().await? > 0 {
            return Ok(None);
        }
        self.register_admin().await.map(Some)
    }

    pub async fn login_admin(&self, request: &AdminLoginRequest) -> Result<SignedIn, ServiceError> {
        let mut errors = FieldErrors::new();
        let username = dto::required(&mut errors, "username", request.username.as_deref());
        dto::required(&mut errors, "password", request.password.as_deref());
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }
        let password = request.password.as_deref().unwrap_or_default();

        let account = self
            .credentials
            .find_admin_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("admin not found"))?;

        if !account.may_sign_in() {
            tracing::warn!(parent: &self.span, admin_id = %account.id, "sign-in refused for non-staff account");
            return Err(ServiceError::Forbidden(
                "this account is not allowed to sign in".to_string(),
            ));
        }

        if !verify_password(password, &account.password_hash) {
            tracing::info!(parent: &self.span, admin_id = %account.id, "admin sign-in with wrong password");
            return Err(ServiceError::Unauthorized("invalid password".to_string()));
        }

        self.sign_in_admin(account)
    }

    fn sign_in_admin(&self, account: AdminAccount) -> Result<SignedIn, ServiceError> {
        let token = self.tokens.issue(Principal::Admin(account.id))?;
        tracing::info!(parent: &self.span, admin_id = %account.id, "admin signed in");
        Ok(SignedIn {
            name: account.username,
            token,
        })
    }

    pub async fn list_staff_usernames(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.credentials.list_staff_usernames().await?)
    }

    pub async fn register_customer(
        &self,
        request: &CustomerRegisterRequest,
    ) -> Result<CustomerAccount, ServiceError> {
        let mut errors = FieldErrors::new();
        let email = dto::required(&mut errors, "email", request.email.as_deref()).to_lowercase();
        let phone = dto::required(&mut errors, "phone", request.phone.as_deref()).to_string();
        dto::required(&mut errors, "password", request.password.as_deref());
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        if !email.is_empty() {
            if email.chars().count() > EMAIL_MAX {
                errors.push("email", format!("ensure this field has no more than {EMAIL_MAX} characters"));
            } else if !looks_like_email(&email) {
                errors.push("email", "enter a valid email address");
            }
        }
        if phone.chars().count() > PHONE_MAX {
            errors.push("phone", format!("ensure this field has no more than {PHONE_MAX} characters"));
        }
        if name.is_some_and(|n| n.chars().count() > NAME_MAX) {
            errors.push("name", format!("ensure this field has no more than {NAME_MAX} characters"));
        }
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }

        if self.credentials.find_customer_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let username = username_from_email(&email).to_string();
        let account = NewCustomerAccount {
            name: name.map(str::to_string).unwrap_or_else(|| username.clone()),
            username,
            password_hash: hash_password(request.password.as_deref().unwrap_or_default())?,
            email,
            phone,
        };

        match self.credentials.insert_customer(account).await {
            Ok(customer) => {
                tracing::info!(parent: &self.span, customer_id = %customer.id, "customer registered");
                Ok(customer)
            }
            Err(StoreError::Duplicate("email")) => Err(email_taken()),
            Err(StoreError::Duplicate("username")) => {
                let mut errors = FieldErrors::new();
                errors.push("username", "a customer with this username already exists");
                Err(ServiceError::invalid_fields(errors))
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn login_customer(&self, request: &CustomerLoginRequest) -> Result<SignedIn, ServiceError> {
        let mut errors = FieldErrors::new();
        let email = dto::required(&mut errors, "email", request.email.as_deref()).to_lowercase();
        dto::required(&mut errors, "password", request.password.as_deref());
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }
        let password = request.password.as_deref().unwrap_or_default();

        let customer = self
            .credentials
            .find_customer_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::validation("customer with this email does not exist"))?;

        if !verify_password(password, &customer.password_hash) {
            tracing::info!(parent: &self.span, customer_id = %customer.id, "customer sign-in with wrong password");
            return Err(ServiceError::validation("incorrect password"));
        }

        let token = self.tokens.issue(Principal::Customer(customer.id))?;
        tracing::info!(parent: &self.span, customer_id = %customer.id, "customer signed in");
        Ok(SignedIn {
            name: customer.name,
            token,
        })
    }

    pub async fn list_customers(&self) -> Result<Vec<CustomerAccount>, ServiceError> {
        Ok(self.credentials.list_customers().await?)
    }

    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), ServiceError> {
        self.credentials.delete_customer(id).await?;
        tracing::info!(parent: &self.span, customer_id = %id, "customer deleted");
        Ok(())
    }
}

fn email_taken() -> ServiceError {
    ServiceError::validation("customer with this email already exists")
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
