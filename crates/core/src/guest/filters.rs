use uuid::Uuid;

use crate::storage::Filter;

use super::columns;

/// Rows that have not been soft-deleted.
pub fn active_filter() -> Filter {
    Filter::all().is_null(columns::DELETED_AT)
}

/// A single non-deleted guest.
pub fn by_id_filter(id: Uuid) -> Filter {
    Filter::all()
        .eq(columns::ID, id)
        .is_null(columns::DELETED_AT)
}

/// Non-deleted guests whose name or address contains `keyword`.
pub fn find_all_filter(keyword: &str) -> Filter {
    let filter = active_filter();
    if keyword.is_empty() {
        return filter;
    }
    filter.group(
        Filter::any()
            .like(columns::NAME, keyword)
            .like(columns::ADDRESS, keyword),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::Guest;
    use crate::storage::{count_statement, Value};

    #[test]
    fn test_find_all_without_keyword() {
        let stmt = count_statement::<Guest>(&find_all_filter("")).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(-1) FROM guests WHERE deleted_at IS NULL"
        );
    }

    #[test]
    fn test_find_all_with_keyword() {
        let stmt = count_statement::<Guest>(&find_all_filter("snow")).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(-1) FROM guests WHERE deleted_at IS NULL AND (name LIKE ? OR address LIKE ?)"
        );
        assert_eq!(stmt.params, vec![Value::Text("%snow%".into()); 2]);
    }

    #[test]
    fn test_by_id() {
        let id = Uuid::now_v7();
        let stmt = count_statement::<Guest>(&by_id_filter(id)).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(-1) FROM guests WHERE id = ? AND deleted_at IS NULL"
        );
        assert_eq!(stmt.params, vec![Value::Text(id.to_string())]);
    }
}
