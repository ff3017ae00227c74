use serde::{Deserialize, Serialize};

use menuhub_core::{CategoryId, DomainResult, FieldErrors};

use crate::fields::{optional_text, required_text};

pub const NAME_MAX: usize = 255;
pub const EMOJI_MAX: usize = 10;

/// Top-level menu grouping. Its name also selects the product pricing mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl NewCategory {
    pub fn validate(self) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        let emoji = optional_text(&mut errors, "emoji", self.emoji.as_deref(), EMOJI_MAX);
        errors.into_result()?;
        Ok(Self { name, emoji })
    }
}

/// Partial update. An explicitly blank `emoji` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
}

impl CategoryPatch {
    pub fn apply_to(self, current: &Category) -> DomainResult<NewCategory> {
        NewCategory {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            emoji: self.emoji.or_else(|| current.emoji.clone()),
        }
        .validate()
    }
}
