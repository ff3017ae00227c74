use std::str::FromStr;

use menuhub_core::DomainError;

use crate::app::errors::ServiceError;

/// Parse a path id (`/:id`) into its typed newtype.
pub fn parse_id<T>(raw: &str) -> Result<T, ServiceError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ServiceError::from)
}

/// `{"message": ...}` body used by deletes and other acknowledgements.
pub fn message(text: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "message": text.into() })
}
