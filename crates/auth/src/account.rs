//! Account records for the two identity systems.
//!
//! Admin and customer accounts are stored separately and never share ids;
//! `Principal` is what ties them together at request time.

use rand::Rng;
use serde::Serialize;

use menuhub_core::{AdminId, CustomerId};

/// Back-office account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub id: AdminId,
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AdminAccount {
    /// Accounts with neither flag exist in the store but may not sign in.
    pub fn may_sign_in(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminAccount {
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Storefront account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerAccount {
    pub id: CustomerId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomerAccount {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Plaintext credentials handed out exactly once at admin registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCredentials {
    pub username: String,
    pub password: String,
}

const CREDENTIAL_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_token(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| CREDENTIAL_ALPHABET[rng.gen_range(0..CREDENTIAL_ALPHABET.len())] as char)
        .collect()
}

/// `admin_` + 6 random `[a-z0-9]`, with an 8 character password from the same alphabet.
pub fn generate_admin_credentials() -> GeneratedCredentials {
    let mut rng = rand::thread_rng();
    GeneratedCredentials {
        username: format!("admin_{}", random_token(&mut rng, 6)),
        password: random_token(&mut rng, 8),
    }
}

/// Customer usernames are the local part of their email address.
pub fn username_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email).trim()
}
