use serde::{Deserialize, Serialize};

use menuhub_core::{BranchId, DomainResult, FieldErrors};

use crate::fields::required_text;

pub const NAME_MAX: usize = 255;
pub const CITY_MAX: usize = 255;

/// A physical location products are sold from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewBranch {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
}

impl NewBranch {
    /// Trim and validate; name uniqueness is the store's concern.
    pub fn validate(self) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        let city = required_text(&mut errors, "city", &self.city, CITY_MAX);
        errors.into_result()?;
        Ok(Self { name, city })
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BranchPatch {
    pub name: Option<String>,
    pub city: Option<String>,
}

impl BranchPatch {
    pub fn apply_to(self, current: &Branch) -> DomainResult<NewBranch> {
        NewBranch {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            city: self.city.unwrap_or_else(|| current.city.clone()),
        }
        .validate()
    }
}
