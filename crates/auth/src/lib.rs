//! `menuhub-auth`: identities, credentials, tokens and the request gate policy.
//!
//! This crate is intentionally decoupled from HTTP and storage: the API layer
//! feeds it a method, a path and an `Authorization` header value, and stores
//! persist the account records defined here.

pub mod account;
pub mod claims;
pub mod gate;
pub mod password;
pub mod principal;
pub mod token;

pub use account::{
    AdminAccount, CustomerAccount, GeneratedCredentials, NewAdminAccount, NewCustomerAccount,
    generate_admin_credentials, username_from_email,
};
pub use claims::TokenClaims;
pub use gate::{AccessPolicy, AccessTier, AuthGate, GateOutcome, GateRejection};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::Principal;
pub use token::{Hs256TokenCodec, TokenCodec, TokenError};
