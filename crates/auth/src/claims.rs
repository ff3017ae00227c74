use serde::{Deserialize, Serialize};

use crate::Principal;

/// Signed token claims (transport-agnostic).
///
/// `id` is the subject: an admin id when `is_admin` is set, a customer id
/// otherwise. `exp` is only present when the codec is configured with a TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier.
    pub id: i64,

    /// Discriminates the identity system the subject belongs to.
    #[serde(default)]
    pub is_admin: bool,

    /// Issued-at (unix seconds).
    #[serde(default)]
    pub iat: i64,

    /// Expiry (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn principal(&self) -> Principal {
        Principal::from_claim(self.id, self.is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_admin_defaults_to_customer() {
        let claims: TokenClaims = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert!(!claims.is_admin);
        assert_eq!(claims.principal(), Principal::Customer(3.into()));
    }

    #[test]
    fn exp_is_omitted_when_unset() {
        let claims = TokenClaims {
            id: 1,
            is_admin: true,
            iat: 10,
            exp: None,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("exp").is_none());
    }
}
