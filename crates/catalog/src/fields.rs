//! Shared field checks. Every check records into a `FieldErrors` so one
//! request reports all of its problems at once.

use menuhub_core::FieldErrors;

pub(crate) const REQUIRED: &str = "this field is required";

pub(crate) fn too_long(max: usize) -> String {
    format!("ensure this field has no more than {max} characters")
}

/// Trimmed, non-empty, at most `max` characters.
pub(crate) fn required_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, REQUIRED);
    } else if value.chars().count() > max {
        errors.push(field, too_long(max));
    }
    value.to_string()
}

/// Blank collapses to `None`.
pub(crate) fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if value.chars().count() > max {
        errors.push(field, too_long(max));
    }
    Some(value.to_string())
}
