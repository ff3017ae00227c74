//! In-memory store for tests and local development.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use menuhub_auth::{AdminAccount, CustomerAccount, NewAdminAccount, NewCustomerAccount};
use menuhub_catalog::{
    Branch, Category, NewBranch, NewCategory, NewProduct, Order, OrderDraft, Product,
    Subcategory, SubcategoryDraft,
};
use menuhub_core::{
    AdminId, BranchId, CategoryId, CustomerId, OrderId, ProductId, SubcategoryId,
};

use super::{CatalogStore, CredentialStore, OrderStore, StoreError};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    admins: BTreeMap<AdminId, AdminAccount>,
    customers: BTreeMap<CustomerId, CustomerAccount>,
    branches: BTreeMap<BranchId, Branch>,
    categories: BTreeMap<CategoryId, Category>,
    subcategories: BTreeMap<SubcategoryId, Subcategory>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
}

impl State {
    /// One sequence across all tables; ids only need to be unique per table.
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product_clash(&self, candidate: &NewProduct, except: Option<ProductId>) -> bool {
        self.products.values().any(|p| {
            Some(p.id) != except
                && p.name == candidate.name
                && p.branch_id == candidate.branch_id
                && p.subcategory_id == candidate.subcategory_id
        })
    }

    fn subcategory_clash(&self, candidate: &SubcategoryDraft, except: Option<SubcategoryId>) -> bool {
        self.subcategories.values().any(|s| {
            Some(s.id) != except && s.name == candidate.name && s.category_id == candidate.category_id
        })
    }

    fn branch_clash(&self, name: &str, except: Option<BranchId>) -> bool {
        self.branches
            .values()
            .any(|b| Some(b.id) != except && b.name == name)
    }
}

/// All three store seams over one `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn count_admins(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.admins.len() as u64)
    }

    async fn insert_admin(&self, account: NewAdminAccount) -> Result<AdminAccount, StoreError> {
        let mut state = self.write()?;
        if state.admins.values().any(|a| a.username == account.username) {
            return Err(StoreError::Duplicate("username"));
        }

        let id = AdminId::new(state.next_id());
        let stored = AdminAccount {
            id,
            username: account.username,
            password_hash: account.password_hash,
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
        };
        state.admins.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self
            .read()?
            .admins
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn list_staff_usernames(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read()?
            .admins
            .values()
            .filter(|a| a.is_staff)
            .map(|a| a.username.clone())
            .collect())
    }

    async fn insert_customer(&self, account: NewCustomerAccount) -> Result<CustomerAccount, StoreError> {
        let mut state = self.write()?;
        if state.customers.values().any(|c| c.email == account.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if state.customers.values().any(|c| c.username == account.username) {
            return Err(StoreError::Duplicate("username"));
        }

        let id = CustomerId::new(state.next_id());
        let stored = CustomerAccount {
            id,
            username: account.username,
            password_hash: account.password_hash,
            name: account.name,
            email: account.email,
            phone: account.phone,
        };
        state.customers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<CustomerAccount>, StoreError> {
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn find_customer_by_username(&self, username: &str) -> Result<Option<CustomerAccount>, StoreError> {
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn list_customers(&self) -> Result<Vec<CustomerAccount>, StoreError> {
        Ok(self.read()?.customers.values().cloned().collect())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        self.write()?
            .customers
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("customer"))
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_branches(&self) -> Result<Vec<Branch>, StoreError> {
        Ok(self.read()?.branches.values().cloned().collect())
    }

    async fn get_branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        Ok(self.read()?.branches.get(&id).cloned())
    }

    async fn insert_branch(&self, branch: NewBranch) -> Result<Branch, StoreError> {
        let mut state = self.write()?;
        if state.branch_clash(&branch.name, None) {
            return Err(StoreError::Duplicate("branch name"));
        }
        let id = BranchId::new(state.next_id());
        let stored = Branch {
            id,
            name: branch.name,
            city: branch.city,
        };
        state.branches.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_branch(&self, id: BranchId, branch: NewBranch) -> Result<Branch, StoreError> {
        let mut state = self.write()?;
        if !state.branches.contains_key(&id) {
            return Err(StoreError::NotFound("branch"));
        }
        if state.branch_clash(&branch.name, Some(id)) {
            return Err(StoreError::Duplicate("branch name"));
        }
        let stored = Branch {
            id,
            name: branch.name,
            city: branch.city,
        };
        state.branches.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_branch(&self, id: BranchId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .branches
            .remove(&id)
            .ok_or(StoreError::NotFound("branch"))?;
        state.products.retain(|_, p| p.branch_id != id);
        Ok(())
    }

    async fn count_branch_products(&self, id: BranchId) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.branch_id == id)
            .count() as u64)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        let mut state = self.write()?;
        let id = CategoryId::new(state.next_id());
        let stored = Category {
            id,
            name: category.name,
            emoji: category.emoji,
        };
        state.categories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> Result<Category, StoreError> {
        let mut state = self.write()?;
        let slot = state
            .categories
            .get_mut(&id)
            .ok_or(StoreError::NotFound("category"))?;
        slot.name = category.name;
        slot.emoji = category.emoji;
        Ok(slot.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .categories
            .remove(&id)
            .ok_or(StoreError::NotFound("category"))?;

        // Mirror ON DELETE CASCADE.
        let orphaned: Vec<SubcategoryId> = state
            .subcategories
            .values()
            .filter(|s| s.category_id == id)
            .map(|s| s.id)
            .collect();
        state.subcategories.retain(|_, s| s.category_id != id);
        state
            .products
            .retain(|_, p| !orphaned.contains(&p.subcategory_id));
        Ok(())
    }

    async fn count_category_subcategories(&self, id: CategoryId) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .subcategories
            .values()
            .filter(|s| s.category_id == id)
            .count() as u64)
    }

    async fn list_subcategories(&self) -> Result<Vec<Subcategory>, StoreError> {
        Ok(self.read()?.subcategories.values().cloned().collect())
    }

    async fn get_subcategory(&self, id: SubcategoryId) -> Result<Option<Subcategory>, StoreError> {
        Ok(self.read()?.subcategories.get(&id).cloned())
    }

    async fn insert_subcategory(&self, subcategory: SubcategoryDraft) -> Result<Subcategory, StoreError> {
        let mut state = self.write()?;
        if !state.categories.contains_key(&subcategory.category_id) {
            return Err(StoreError::NotFound("category"));
        }
        if state.subcategory_clash(&subcategory, None) {
            return Err(StoreError::Duplicate("subcategory name in category"));
        }
        let id = SubcategoryId::new(state.next_id());
        let stored = Subcategory {
            id,
            name: subcategory.name,
            category_id: subcategory.category_id,
        };
        state.subcategories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_subcategory(
        &self,
        id: SubcategoryId,
        subcategory: SubcategoryDraft,
    ) -> Result<Subcategory, StoreError> {
        let mut state = self.write()?;
        if !state.subcategories.contains_key(&id) {
            return Err(StoreError::NotFound("subcategory"));
        }
        if !state.categories.contains_key(&subcategory.category_id) {
            return Err(StoreError::NotFound("category"));
        }
        if state.subcategory_clash(&subcategory, Some(id)) {
            return Err(StoreError::Duplicate("subcategory name in category"));
        }
        let stored = Subcategory {
            id,
            name: subcategory.name,
            category_id: subcategory.category_id,
        };
        state.subcategories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .subcategories
            .remove(&id)
            .ok_or(StoreError::NotFound("subcategory"))?;
        state.products.retain(|_, p| p.subcategory_id != id);
        Ok(())
    }

    async fn count_subcategory_products(&self, id: SubcategoryId) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.subcategory_id == id)
            .count() as u64)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut state = self.write()?;
        if !state.branches.contains_key(&product.branch_id) {
            return Err(StoreError::NotFound("branch"));
        }
        if !state.subcategories.contains_key(&product.subcategory_id) {
            return Err(StoreError::NotFound("subcategory"));
        }
        if state.product_clash(&product, None) {
            return Err(StoreError::Duplicate("product in branch and subcategory"));
        }
        let id = ProductId::new(state.next_id());
        let stored = Product {
            id,
            name: product.name,
            image_ref: product.image_ref,
            branch_id: product.branch_id,
            subcategory_id: product.subcategory_id,
            pricing: product.pricing,
        };
        state.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
        let mut state = self.write()?;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound("product"));
        }
        if !state.branches.contains_key(&product.branch_id) {
            return Err(StoreError::NotFound("branch"));
        }
        if !state.subcategories.contains_key(&product.subcategory_id) {
            return Err(StoreError::NotFound("subcategory"));
        }
        if state.product_clash(&product, Some(id)) {
            return Err(StoreError::Duplicate("product in branch and subcategory"));
        }
        let stored = Product {
            id,
            name: product.name,
            image_ref: product.image_ref,
            branch_id: product.branch_id,
            subcategory_id: product.subcategory_id,
            pricing: product.pricing,
        };
        state.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.write()?
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("product"))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: OrderDraft) -> Result<Order, StoreError> {
        let mut state = self.write()?;
        let id = OrderId::new(state.next_id());
        let stored = Order {
            id,
            customer_id: order.customer_id,
            name: order.name,
            phone: order.phone,
            address: order.address,
            delivery_method: order.delivery_method,
            cart: order.cart,
            created_at: Utc::now(),
        };
        state.orders.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.read()?.orders.values().rev().cloned().collect())
    }
}
