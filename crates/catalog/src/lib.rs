//! Catalog domain: branches, categories, subcategories, products and orders.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Input types validate and
//! normalize themselves; the pricing validator decides which pricing form a
//! product write must carry.

pub mod branch;
pub mod category;
mod fields;
pub mod order;
pub mod pricing;
pub mod product;
pub mod subcategory;

pub use branch::{Branch, BranchPatch, NewBranch};
pub use category::{Category, CategoryPatch, NewCategory};
pub use order::{DeliveryMethod, NewOrder, Order, OrderDraft};
pub use pricing::{
    PricingError, PricingMode, PricingPayload, PricingRules, WriteIntent, validate as validate_pricing,
};
pub use product::{NewProduct, Pricing, Product, VariantPrices, validate_product_name};
pub use subcategory::{NewSubcategory, Subcategory, SubcategoryDraft, SubcategoryPatch};
