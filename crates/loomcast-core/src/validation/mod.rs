//! Field validation shared by the models.

use crate::error::ValidationError;
use crate::models::FormFields;
use validator::Validate;

/// Reject empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Validate the required form fields, reporting the first missing one.
pub fn validate_form_fields(fields: &FormFields) -> Result<(), ValidationError> {
    let Err(errors) = fields.validate() else {
        return Ok(());
    };

    let field_errors = errors.field_errors();
    for field in ["title", "description"] {
        if field_errors.contains_key(field) {
            return Err(ValidationError::MissingField(field.to_string()));
        }
    }

    Err(ValidationError::MissingField(errors.to_string()))
}
