//! Request bodies and multipart parsing.
//!
//! Fields are `Option`s wherever a missing value must produce a field-level
//! validation error rather than a deserialization failure.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use menuhub_core::FieldErrors;
use menuhub_infra::ImageUpload;

use crate::app::errors::ServiceError;
use crate::app::services::ProductInput;

// -------------------------
// Extractors
// -------------------------

/// JSON request body. Rejections render as the usual `{"error","message"}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Product fields read from a `multipart/form-data` body.
#[derive(Debug)]
pub struct ProductForm(pub ProductInput);

#[axum::async_trait]
impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        product_input(multipart).await.map(Self)
    }
}

// -------------------------
// Accounts
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerRegisterRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromoRequest {
    #[serde(rename = "promoCode")]
    pub promo_code: Option<String>,
    pub username: Option<String>,
}

/// Trimmed value of a required text field, or a "required" error under `field`.
pub fn required<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> &'a str {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            errors.push(field, "this field is required");
            ""
        }
    }
}

// -------------------------
// Products (multipart)
// -------------------------

/// Collect the product form fields. Unknown parts are ignored; an `image` part
/// with no file name or no bytes counts as "no new image".
pub async fn product_input(mut multipart: Multipart) -> Result<ProductInput, ServiceError> {
    let mut input = ProductInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::validation(format!("failed to read image: {e}")))?;
            if !file_name.is_empty() && !bytes.is_empty() {
                input.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ServiceError::validation(format!("failed to read field `{name}`: {e}")))?;

        match name.as_str() {
            "name" => input.name = Some(value),
            "branch" => input.branch = Some(value),
            "subcategory" => input.subcategory = Some(value),
            "price" => input.price = Some(value),
            "prices" => input.prices = Some(value),
            _ => {}
        }
    }

    Ok(input)
}
