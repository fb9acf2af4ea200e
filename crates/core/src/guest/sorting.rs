use crate::error::ServiceError;
use crate::storage::{Sort, SortDirection};

use super::columns;

const SORTABLE: &[&str] = &[columns::NAME, columns::ADDRESS];

/// Parses `field.direction,…` into sorts.
///
/// Only `name` and `address` are sortable; a missing direction means ascending
/// and an empty string means no ordering.
pub fn parse_sorts(input: &str) -> Result<Vec<Sort>, ServiceError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .map(|part| {
            let mut pieces = part.split('.');
            let field = pieces.next().unwrap_or_default();
            if !SORTABLE.contains(&field) {
                return Err(ServiceError::invalid_field("sorts", "invalid sorts field"));
            }
            let direction = match pieces.next() {
                None => SortDirection::Asc,
                Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                Some(_) => {
                    return Err(ServiceError::invalid_field(
                        "sorts",
                        "invalid sorts direction",
                    ))
                }
            };
            Ok(Sort {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}
