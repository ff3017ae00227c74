use serde::{Deserialize, Serialize};

use menuhub_core::{AdminId, CustomerId};

/// An authenticated actor.
///
/// Admins and customers live in two disjoint account stores; the token's
/// `is_admin` claim is the discriminant that says which one `id` refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
    Admin(AdminId),
    Customer(CustomerId),
}

impl Principal {
    pub fn from_claim(id: i64, is_admin: bool) -> Self {
        if is_admin {
            Self::Admin(AdminId::new(id))
        } else {
            Self::Customer(CustomerId::new(id))
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Raw subject id as carried in the token.
    pub fn subject_id(&self) -> i64 {
        match self {
            Self::Admin(id) => id.get(),
            Self::Customer(id) => id.get(),
        }
    }

    pub fn admin_id(&self) -> Option<AdminId> {
        match self {
            Self::Admin(id) => Some(*id),
            Self::Customer(_) => None,
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::Customer(id) => Some(*id),
            Self::Admin(_) => None,
        }
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Admin(id) => write!(f, "admin:{id}"),
            Self::Customer(id) => write!(f, "customer:{id}"),
        }
    }
}
