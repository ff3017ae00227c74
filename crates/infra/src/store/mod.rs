//! Record stores.
//!
//! Three seams, split by what the services need: credentials for the two
//! account systems, the catalog tree, and orders. Both backends enforce the
//! same uniqueness rules and report them as `StoreError::Duplicate`.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use menuhub_auth::{AdminAccount, CustomerAccount, NewAdminAccount, NewCustomerAccount};
use menuhub_catalog::{
    Branch, Category, NewBranch, NewCategory, NewProduct, Order, OrderDraft, Product,
    Subcategory, SubcategoryDraft,
};
use menuhub_core::{BranchId, CategoryId, CustomerId, ProductId, SubcategoryId};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness rule tripped. Names the conflicting field.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn count_admins(&self) -> Result<u64, StoreError>;

    /// `Duplicate("username")` on a taken username.
    async fn insert_admin(&self, account: NewAdminAccount) -> Result<AdminAccount, StoreError>;

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError>;

    /// Usernames of staff accounts, oldest first.
    async fn list_staff_usernames(&self) -> Result<Vec<String>, StoreError>;

    /// `Duplicate("email")` or `Duplicate("username")`.
    async fn insert_customer(&self, account: NewCustomerAccount) -> Result<CustomerAccount, StoreError>;

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<CustomerAccount>, StoreError>;

    async fn find_customer_by_username(&self, username: &str) -> Result<Option<CustomerAccount>, StoreError>;

    async fn list_customers(&self) -> Result<Vec<CustomerAccount>, StoreError>;

    async fn delete_customer(&self, id: CustomerId) -> Result<(), StoreError>;
}

/// Branch → Product ← Subcategory → Category.
///
/// Deletes do not check dependents; callers count them first.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_branches(&self) -> Result<Vec<Branch>, StoreError>;
    async fn get_branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError>;
    async fn insert_branch(&self, branch: NewBranch) -> Result<Branch, StoreError>;
    async fn update_branch(&self, id: BranchId, branch: NewBranch) -> Result<Branch, StoreError>;
    async fn delete_branch(&self, id: BranchId) -> Result<(), StoreError>;
    async fn count_branch_products(&self, id: BranchId) -> Result<u64, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
    async fn insert_category(&self, category: NewCategory) -> Result<Category, StoreError>;
    async fn update_category(&self, id: CategoryId, category: NewCategory) -> Result<Category, StoreError>;
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError>;
    async fn count_category_subcategories(&self, id: CategoryId) -> Result<u64, StoreError>;

    async fn list_subcategories(&self) -> Result<Vec<Subcategory>, StoreError>;
    async fn get_subcategory(&self, id: SubcategoryId) -> Result<Option<Subcategory>, StoreError>;
    async fn insert_subcategory(&self, subcategory: SubcategoryDraft) -> Result<Subcategory, StoreError>;
    async fn update_subcategory(
        &self,
        id: SubcategoryId,
        subcategory: SubcategoryDraft,
    ) -> Result<Subcategory, StoreError>;
    async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), StoreError>;
    async fn count_subcategory_products(&self, id: SubcategoryId) -> Result<u64, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;
    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError>;
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: OrderDraft) -> Result<Order, StoreError>;

    /// Newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
}
