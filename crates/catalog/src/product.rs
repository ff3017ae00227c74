use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use menuhub_core::{BranchId, DomainResult, FieldErrors, ProductId, SubcategoryId};

use crate::fields::required_text;

pub const NAME_MAX: usize = 255;

/// Size name → price for a variant-priced product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantPrices(BTreeMap<String, Decimal>);

impl VariantPrices {
    pub fn new(prices: BTreeMap<String, Decimal>) -> Self {
        Self(prices)
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.0.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for VariantPrices {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Exactly one pricing form per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pricing {
    Flat(Decimal),
    Variant(VariantPrices),
}

impl Pricing {
    /// The single price, for flat-priced products.
    pub fn price(&self) -> Option<Decimal> {
        match self {
            Self::Flat(price) => Some(*price),
            Self::Variant(_) => None,
        }
    }

    /// The per-size prices, for variant-priced products.
    pub fn prices(&self) -> Option<&VariantPrices> {
        match self {
            Self::Flat(_) => None,
            Self::Variant(prices) => Some(prices),
        }
    }

    /// Rebuild from the two nullable storage columns.
    ///
    /// Returns `None` when both or neither are set.
    pub fn from_columns(price: Option<Decimal>, prices: Option<VariantPrices>) -> Option<Self> {
        match (price, prices) {
            (Some(price), None) => Some(Self::Flat(price)),
            (None, Some(prices)) => Some(Self::Variant(prices)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image_ref: Option<String>,
    pub branch_id: BranchId,
    pub subcategory_id: SubcategoryId,
    pub pricing: Pricing,
}

/// A fully validated product write (create, or the merged result of an update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub image_ref: Option<String>,
    pub branch_id: BranchId,
    pub subcategory_id: SubcategoryId,
    pub pricing: Pricing,
}

pub fn validate_product_name(name: &str) -> DomainResult<String> {
    let mut errors = FieldErrors::new();
    let name = required_text(&mut errors, "name", name, NAME_MAX);
    errors.into_result()?;
    Ok(name)
}
