//! Product writes: field checks, pricing resolution and image blob ordering.
//!
//! Blob ordering:
//! - create/update store the new blob first and drop it again if the record
//!   write fails;
//! - update releases the replaced blob only after the record is written;
//! - delete releases the blob first and keeps the record if that fails.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use menuhub_catalog::{
    Branch, NewProduct, PricingPayload, PricingRules, Product, Subcategory, VariantPrices,
    WriteIntent, validate_pricing, validate_product_name,
};
use menuhub_core::{BranchId, CategoryId, DomainError, FieldErrors, ProductId, SubcategoryId};
use menuhub_infra::{BlobStore, CatalogStore, ImageUpload};

use crate::app::errors::ServiceError;

/// Raw product form fields. `None` means the field was not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInput {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub subcategory: Option<String>,
    pub price: Option<String>,
    pub prices: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRef {
    pub id: BranchId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryRef {
    pub id: SubcategoryId,
    pub name: String,
    pub category: CategoryId,
}

/// Product as returned to clients. Exactly one of `price`/`prices` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub branch: BranchRef,
    pub subcategory: SubcategoryRef,
    pub price: Option<Decimal>,
    pub prices: Option<VariantPrices>,
}

pub struct ProductService {
    store: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
    pricing: PricingRules,
    span: tracing::Span,
}

/// Branch and subcategory a write points at, after existence checks.
struct Placement {
    branch: Branch,
    subcategory: Subcategory,
    category_name: String,
}

impl ProductService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        blobs: Arc<dyn BlobStore>,
        pricing: PricingRules,
        span: tracing::Span,
    ) -> Self {
        Self {
            store,
            blobs,
            pricing,
            span,
        }
    }

    pub async fn list(&self) -> Result<Vec<ProductView>, ServiceError> {
        let products = self.store.list_products().await?;
        let branches: HashMap<BranchId, Branch> = self
            .store
            .list_branches()
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let subcategories: HashMap<SubcategoryId, Subcategory> = self
            .store
            .list_subcategories()
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        products
            .into_iter()
            .map(|product| {
                let branch = branches
                    .get(&product.branch_id)
                    .ok_or_else(|| dangling(&product, "branch"))?;
                let subcategory = subcategories
                    .get(&product.subcategory_id)
                    .ok_or_else(|| dangling(&product, "subcategory"))?;
                Ok(self.view(product, branch, subcategory))
            })
            .collect()
    }

    pub async fn get(&self, id: ProductId) -> Result<ProductView, ServiceError> {
        let product = self.find(id).await?;
        let branch = self
            .store
            .get_branch(product.branch_id)
            .await?
            .ok_or_else(|| dangling(&product, "branch"))?;
        let subcategory = self
            .store
            .get_subcategory(product.subcategory_id)
            .await?
            .ok_or_else(|| dangling(&product, "subcategory"))?;
        Ok(self.view(product, &branch, &subcategory))
    }

    pub async fn create(&self, input: ProductInput) -> Result<ProductView, ServiceError> {
        let mut errors = FieldErrors::new();
        let name = required_name(&mut errors, input.name.as_deref());
        let branch_id = required_id::<BranchId>(&mut errors, "branch", input.branch.as_deref());
        let subcategory_id =
            required_id::<SubcategoryId>(&mut errors, "subcategory", input.subcategory.as_deref());
        let (Some(name), Some(branch_id), Some(subcategory_id)) = (name, branch_id, subcategory_id) else {
            return Err(ServiceError::invalid_fields(errors));
        };

        let placement = self.place(branch_id, subcategory_id).await?;
        let mode = self.pricing.resolve(&placement.category_name);
        let payload = PricingPayload::new(input.price.as_deref(), input.prices.as_deref());
        let pricing = validate_pricing(&mode, &payload, WriteIntent::Create)?;

        let image_ref = self.store_image(input.image.as_ref()).await?;
        let record = NewProduct {
            name,
            image_ref: image_ref.clone(),
            branch_id,
            subcategory_id,
            pricing,
        };

        let product = match self.store.insert_product(record).await {
            Ok(product) => product,
            Err(e) => {
                self.discard_image(image_ref.as_deref()).await;
                return Err(e.into());
            }
        };

        tracing::info!(parent: &self.span, product_id = %product.id, mode = ?mode, "product created");
        Ok(self.view(product, &placement.branch, &placement.subcategory))
    }

    /// Partial update; omitted fields keep their current value.
    pub async fn update(&self, id: ProductId, input: ProductInput) -> Result<ProductView, ServiceError> {
        let current = self.find(id).await?;

        let mut errors = FieldErrors::new();
        let name = match input.name.as_deref() {
            Some(raw) => required_name(&mut errors, Some(raw)),
            None => Some(current.name.clone()),
        };
        let branch_id = match input.branch.as_deref() {
            Some(raw) => required_id::<BranchId>(&mut errors, "branch", Some(raw)),
            None => Some(current.branch_id),
        };
        let subcategory_id = match input.subcategory.as_deref() {
            Some(raw) => required_id::<SubcategoryId>(&mut errors, "subcategory", Some(raw)),
            None => Some(current.subcategory_id),
        };
        let (Some(name), Some(branch_id), Some(subcategory_id)) = (name, branch_id, subcategory_id) else {
            return Err(ServiceError::invalid_fields(errors));
        };

        let placement = self.place(branch_id, subcategory_id).await?;
        let mode = self.pricing.resolve(&placement.category_name);
        let payload = PricingPayload::new(input.price.as_deref(), input.prices.as_deref());
        let pricing = validate_pricing(
            &mode,
            &payload,
            WriteIntent::Update {
                current: &current.pricing,
            },
        )?;

        let new_image = self.store_image(input.image.as_ref()).await?;
        let record = NewProduct {
            name,
            image_ref: new_image.clone().or_else(|| current.image_ref.clone()),
            branch_id,
            subcategory_id,
            pricing,
        };

        let product = match self.store.update_product(id, record).await {
            Ok(product) => product,
            Err(e) => {
                self.discard_image(new_image.as_deref()).await;
                return Err(e.into());
            }
        };

        if new_image.is_some() {
            if let Some(old) = current.image_ref.as_deref() {
                if let Err(e) = self.blobs.delete(old).await {
                    tracing::warn!(parent: &self.span, product_id = %id, image_ref = %old, error = %e, "failed to release replaced image");
                }
            }
        }

        tracing::info!(parent: &self.span, product_id = %id, mode = ?mode, "product updated");
        Ok(self.view(product, &placement.branch, &placement.subcategory))
    }

    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        let product = self.find(id).await?;

        if let Some(image_ref) = product.image_ref.as_deref() {
            self.blobs.delete(image_ref).await.map_err(|e| {
                tracing::error!(parent: &self.span, product_id = %id, %image_ref, error = %e, "failed to release image, keeping product");
                ServiceError::internal(format!("failed to delete product image: {e}"))
            })?;
        }

        self.store.delete_product(id).await?;
        tracing::info!(parent: &self.span, product_id = %id, "product deleted");
        Ok(())
    }

    async fn find(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product not found"))
    }

    async fn place(
        &self,
        branch_id: BranchId,
        subcategory_id: SubcategoryId,
    ) -> Result<Placement, ServiceError> {
        let branch = self
            .store
            .get_branch(branch_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("branch not found"))?;
        let subcategory = self
            .store
            .get_subcategory(subcategory_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("subcategory not found"))?;

        let category = self
            .store
            .get_category(subcategory.category_id)
            .await?
            .ok_or_else(|| ServiceError::internal(format!("subcategory {subcategory_id} has no category")))?;

        Ok(Placement {
            branch,
            subcategory,
            category_name: category.name,
        })
    }

    async fn store_image(&self, upload: Option<&ImageUpload>) -> Result<Option<String>, ServiceError> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        upload.validate()?;
        let image_ref = self.blobs.put(upload).await?;
        tracing::debug!(parent: &self.span, %image_ref, bytes = upload.bytes.len(), "image stored");
        Ok(Some(image_ref))
    }

    async fn discard_image(&self, image_ref: Option<&str>) {
        let Some(image_ref) = image_ref else {
            return;
        };
        if let Err(e) = self.blobs.delete(image_ref).await {
            tracing::warn!(parent: &self.span, %image_ref, error = %e, "failed to discard orphaned image");
        }
    }

    fn view(&self, product: Product, branch: &Branch, subcategory: &Subcategory) -> ProductView {
        ProductView {
            id: product.id,
            image: product.image_ref.as_deref().map(|r| self.blobs.url(r)),
            branch: BranchRef {
                id: branch.id,
                name: branch.name.clone(),
            },
            subcategory: SubcategoryRef {
                id: subcategory.id,
                name: subcategory.name.clone(),
                category: subcategory.category_id,
            },
            price: product.pricing.price(),
            prices: product.pricing.prices().cloned(),
            name: product.name,
        }
    }
}

fn dangling(product: &Product, what: &str) -> ServiceError {
    ServiceError::internal(format!("product {} references a missing {what}", product.id))
}

fn required_name(errors: &mut FieldErrors, raw: Option<&str>) -> Option<String> {
    match validate_product_name(raw.unwrap_or_default()) {
        Ok(name) => Some(name),
        Err(DomainError::InvalidFields(field_errors)) => {
            for field in field_errors.fields() {
                for message in field_errors.get(field).unwrap_or_default() {
                    errors.push(field, message.clone());
                }
            }
            None
        }
        Err(other) => {
            errors.push("name", other.to_string());
            None
        }
    }
}

fn required_id<T: FromStr<Err = DomainError>>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&str>,
) -> Option<T> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            errors.push(field, "this field is required");
            None
        }
        Some(raw) => match raw.parse::<T>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(field, format!("`{raw}` is not a valid id"));
                None
            }
        },
    }
}
