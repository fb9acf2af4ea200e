use uuid::Uuid;

use crate::error::FieldError;

/// Records `"<field> is a required field"` when `value` is empty.
/// Whitespace counts as a value.
pub fn validate_required(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is a required field")));
    }
}

/// Records `"<field> must be a valid RFC4122 UUID"` when `value` does not parse.
pub fn validate_uuid(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    let valid = Uuid::parse_str(value)
        .map(|id| id.get_variant() == uuid::Variant::RFC4122)
        .unwrap_or(false);
    if !valid {
        errors.push(FieldError::new(
            field,
            format!("{field} must be a valid RFC4122 UUID"),
        ));
    }
}
