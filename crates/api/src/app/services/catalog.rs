//! Branches, categories and subcategories.
//!
//! Deletes are refused while children exist even though the Postgres schema
//! would cascade.

use std::sync::Arc;

use menuhub_catalog::{
    Branch, BranchPatch, Category, CategoryPatch, NewBranch, NewCategory, NewSubcategory,
    Subcategory, SubcategoryDraft, SubcategoryPatch,
};
use menuhub_core::{BranchId, CategoryId, DomainError, FieldErrors, SubcategoryId};
use menuhub_infra::CatalogStore;

use crate::app::errors::ServiceError;

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    span: tracing::Span,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, span: tracing::Span) -> Self {
        Self { store, span }
    }

    // -------------------------
    // Branches
    // -------------------------

    pub async fn list_branches(&self) -> Result<Vec<Branch>, ServiceError> {
        Ok(self.store.list_branches().await?)
    }

    pub async fn create_branch(&self, input: NewBranch) -> Result<Branch, ServiceError> {
        let branch = self.store.insert_branch(input.validate()?).await?;
        tracing::info!(parent: &self.span, branch_id = %branch.id, "branch created");
        Ok(branch)
    }

    pub async fn update_branch(&self, id: BranchId, patch: BranchPatch) -> Result<Branch, ServiceError> {
        let current = self
            .store
            .get_branch(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("branch not found"))?;
        let branch = self.store.update_branch(id, patch.apply_to(&current)?).await?;
        tracing::info!(parent: &self.span, branch_id = %id, "branch updated");
        Ok(branch)
    }

    pub async fn delete_branch(&self, id: BranchId) -> Result<(), ServiceError> {
        if self.store.get_branch(id).await?.is_none() {
            return Err(ServiceError::not_found("branch not found"));
        }
        let products = self.store.count_branch_products(id).await?;
        self.refuse_if_referenced("branch", products)?;

        self.store.delete_branch(id).await?;
        tracing::info!(parent: &self.span, branch_id = %id, "branch deleted");
        Ok(())
    }

    // -------------------------
    // Categories
    // -------------------------

    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category, ServiceError> {
        let category = self.store.insert_category(input.validate()?).await?;
        tracing::info!(parent: &self.span, category_id = %category.id, "category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, ServiceError> {
        let current = self
            .store
            .get_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("category not found"))?;
        let category = self.store.update_category(id, patch.apply_to(&current)?).await?;
        if category.name != current.name {
            // Existing products keep whatever pricing they were written with.
            tracing::info!(parent: &self.span, category_id = %id, from = %current.name, to = %category.name, "category renamed");
        }
        Ok(category)
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        if self.store.get_category(id).await?.is_none() {
            return Err(ServiceError::not_found("category not found"));
        }
        let subcategories = self.store.count_category_subcategories(id).await?;
        self.refuse_if_referenced("category", subcategories)?;

        self.store.delete_category(id).await?;
        tracing::info!(parent: &self.span, category_id = %id, "category deleted");
        Ok(())
    }

    // -------------------------
    // Subcategories
    // -------------------------

    pub async fn list_subcategories(&self) -> Result<Vec<Subcategory>, ServiceError> {
        Ok(self.store.list_subcategories().await?)
    }

    pub async fn get_subcategory(&self, id: SubcategoryId) -> Result<Subcategory, ServiceError> {
        self.store
            .get_subcategory(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("subcategory not found"))
    }

    pub async fn create_subcategory(&self, input: NewSubcategory) -> Result<Subcategory, ServiceError> {
        let draft = input.validate()?;
        self.ensure_category(&draft).await?;

        let subcategory = self.store.insert_subcategory(draft).await?;
        tracing::info!(parent: &self.span, subcategory_id = %subcategory.id, "subcategory created");
        Ok(subcategory)
    }

    pub async fn update_subcategory(
        &self,
        id: SubcategoryId,
        patch: SubcategoryPatch,
    ) -> Result<Subcategory, ServiceError> {
        let current = self.get_subcategory(id).await?;
        let draft = patch.apply_to(&current)?;
        self.ensure_category(&draft).await?;

        let subcategory = self.store.update_subcategory(id, draft).await?;
        tracing::info!(parent: &self.span, subcategory_id = %id, "subcategory updated");
        Ok(subcategory)
    }

    pub async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), ServiceError> {
        self.get_subcategory(id).await?;
        let products = self.store.count_subcategory_products(id).await?;
        self.refuse_if_referenced("subcategory", products)?;

        self.store.delete_subcategory(id).await?;
        tracing::info!(parent: &self.span, subcategory_id = %id, "subcategory deleted");
        Ok(())
    }

    async fn ensure_category(&self, draft: &SubcategoryDraft) -> Result<(), ServiceError> {
        if self.store.get_category(draft.category_id).await?.is_some() {
            return Ok(());
        }
        let mut errors = FieldErrors::new();
        errors.push("category", format!("category {} does not exist", draft.category_id));
        Err(ServiceError::invalid_fields(errors))
    }

    fn refuse_if_referenced(&self, entity: &'static str, dependents: u64) -> Result<(), ServiceError> {
        if dependents == 0 {
            return Ok(());
        }
        tracing::info!(parent: &self.span, %entity, dependents, "delete refused");
        Err(DomainError::conflict(format!("{entity} has dependents")).into())
    }
}
