//! Conversions between core query values and sqlx SQLite types.

use guestbook_core::storage::{RepositoryError, Row, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};

/// Binds positional parameters in order.
pub fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &'q [Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Integer(i) => query.bind(*i),
            Value::Real(r) => query.bind(*r),
            Value::Bool(b) => query.bind(*b),
        };
    }
    query
}

/// Decodes a driver row by the storage class of each value.
pub fn to_row(row: &SqliteRow) -> Result<Row, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Serialization(e.to_string());

    let mut columns = Vec::with_capacity(row.columns().len());
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(decode)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get(index).map_err(decode)?),
                "REAL" | "NUMERIC" => Value::Real(row.try_get(index).map_err(decode)?),
                "TEXT" | "DATE" | "TIME" | "DATETIME" => {
                    Value::Text(row.try_get(index).map_err(decode)?)
                }
                other => {
                    return Err(RepositoryError::Serialization(format!(
                        "unsupported column type {other} for `{}`",
                        column.name()
                    )))
                }
            }
        };

        columns.push((column.name().to_string(), value));
    }

    Ok(Row::new(columns))
}
