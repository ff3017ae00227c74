use serde::{Deserialize, Serialize};

use menuhub_core::{CategoryId, DomainError, DomainResult, FieldErrors, SubcategoryId};

use crate::fields::{REQUIRED, required_text};

pub const NAME_MAX: usize = 255;

/// Second-level grouping; `(category, name)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub name: String,
    #[serde(rename = "category")]
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewSubcategory {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "category")]
    pub category_id: Option<CategoryId>,
}

/// A validated subcategory write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryDraft {
    pub name: String,
    pub category_id: CategoryId,
}

impl NewSubcategory {
    pub fn validate(self) -> DomainResult<SubcategoryDraft> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        let Some(category_id) = self.category_id else {
            errors.push("category", REQUIRED);
            return Err(DomainError::InvalidFields(errors));
        };
        errors.into_result()?;

        Ok(SubcategoryDraft { name, category_id })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubcategoryPatch {
    pub name: Option<String>,
    #[serde(rename = "category")]
    pub category_id: Option<CategoryId>,
}

impl SubcategoryPatch {
    pub fn apply_to(self, current: &Subcategory) -> DomainResult<SubcategoryDraft> {
        NewSubcategory {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            category_id: Some(self.category_id.unwrap_or(current.category_id)),
        }
        .validate()
    }
}
