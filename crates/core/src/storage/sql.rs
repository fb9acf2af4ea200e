//! Pure SQL statement builders.
//!
//! Every builder is a function of the entity descriptor and the query model;
//! values never appear in the SQL text, only as positional `?` parameters.
//! Field names are checked against [`Entity::COLUMNS`].

use super::{Clause, Entity, Filter, Logic, Operator, RepositoryError, Result, Sort, Value};

/// A rendered statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

fn check_column<E: Entity>(field: &str) -> Result<()> {
    if E::COLUMNS.contains(&field) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidData(format!(
            "unknown column `{field}` for table `{}`",
            E::TABLE
        )))
    }
}

fn render_filter<E: Entity>(filter: &Filter, params: &mut Vec<Value>) -> Result<String> {
    let joiner = match filter.logic {
        Logic::And => " AND ",
        Logic::Or => " OR ",
    };

    let mut parts = Vec::with_capacity(filter.clauses.len());
    for clause in &filter.clauses {
        match clause {
            Clause::Condition(cond) => {
                check_column::<E>(&cond.field)?;
                let part = match cond.operator {
                    Operator::IsNull => format!("{} IS NULL", cond.field),
                    Operator::IsNotNull => format!("{} IS NOT NULL", cond.field),
                    Operator::Like => {
                        let needle = match &cond.value {
                            Value::Text(s) => s.clone(),
                            Value::Integer(i) => i.to_string(),
                            Value::Real(r) => r.to_string(),
                            Value::Bool(b) => b.to_string(),
                            Value::Null => String::new(),
                        };
                        params.push(Value::Text(format!("%{needle}%")));
                        format!("{} LIKE ?", cond.field)
                    }
                    op => {
                        params.push(cond.value.clone());
                        format!("{} {} ?", cond.field, comparison(op))
                    }
                };
                parts.push(part);
            }
            Clause::Group(group) => {
                if group.is_empty() {
                    continue;
                }
                parts.push(format!("({})", render_filter::<E>(group, params)?));
            }
        }
    }

    Ok(parts.join(joiner))
}

fn comparison(op: Operator) -> &'static str {
    match op {
        Operator::Eq => "=",
        Operator::NotEq => "<>",
        Operator::Gt => ">",
        Operator::Gte => ">=",
        Operator::Lt => "<",
        Operator::Lte => "<=",
        Operator::Like => "LIKE",
        Operator::IsNull => "IS NULL",
        Operator::IsNotNull => "IS NOT NULL",
    }
}

fn where_clause<E: Entity>(filter: &Filter, params: &mut Vec<Value>) -> Result<String> {
    if filter.is_empty() {
        return Ok(String::new());
    }
    let rendered = render_filter::<E>(filter, params)?;
    if rendered.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {rendered}"))
    }
}

fn order_clause<E: Entity>(sorts: &[Sort]) -> Result<String> {
    if sorts.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(sorts.len());
    for sort in sorts {
        check_column::<E>(&sort.field)?;
        parts.push(format!("{} {}", sort.field, sort.direction.as_sql()));
    }
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

/// `SELECT <columns> FROM <table> [WHERE] [ORDER BY] [LIMIT ? OFFSET ?]`.
pub fn select_statement<E: Entity>(
    filter: &Filter,
    sorts: &[Sort],
    limit: Option<u64>,
    offset: u64,
) -> Result<Statement> {
    let mut params = Vec::new();
    let mut sql = format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE);
    sql.push_str(&where_clause::<E>(filter, &mut params)?);
    sql.push_str(&order_clause::<E>(sorts)?);
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(clamp_i64(limit)));
        params.push(Value::Integer(clamp_i64(offset)));
    }
    Ok(Statement { sql, params })
}

/// `SELECT COUNT(-1) FROM <table> [WHERE]`.
pub fn count_statement<E: Entity>(filter: &Filter) -> Result<Statement> {
    let mut params = Vec::new();
    let mut sql = format!("SELECT COUNT(-1) FROM {}", E::TABLE);
    sql.push_str(&where_clause::<E>(filter, &mut params)?);
    Ok(Statement { sql, params })
}

/// Single-row `INSERT` of every mapped column.
pub fn insert_statement<E: Entity>(entity: &E) -> Result<Statement> {
    let params = entity.to_values();
    if params.len() != E::COLUMNS.len() {
        return Err(RepositoryError::InvalidData(format!(
            "{} values for {} columns",
            params.len(),
            E::COLUMNS.len()
        )));
    }
    let placeholders = vec!["?"; params.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::TABLE,
        E::COLUMNS.join(", "),
        placeholders
    );
    Ok(Statement { sql, params })
}

/// `UPDATE` setting every mapped column except the primary key.
pub fn update_statement<E: Entity>(entity: &E, filter: &Filter) -> Result<Statement> {
    let values = entity.to_values();
    if values.len() != E::COLUMNS.len() {
        return Err(RepositoryError::InvalidData(format!(
            "{} values for {} columns",
            values.len(),
            E::COLUMNS.len()
        )));
    }

    let mut params = Vec::with_capacity(values.len());
    let mut sets = Vec::with_capacity(values.len());
    for (column, value) in E::COLUMNS.iter().zip(values) {
        if *column == E::PRIMARY_KEY {
            continue;
        }
        sets.push(format!("{column} = ?"));
        params.push(value);
    }

    let mut sql = format!("UPDATE {} SET {}", E::TABLE, sets.join(", "));
    sql.push_str(&where_clause::<E>(filter, &mut params)?);
    Ok(Statement { sql, params })
}

/// Physical `DELETE FROM <table> [WHERE]`.
pub fn delete_statement<E: Entity>(filter: &Filter) -> Result<Statement> {
    let mut params = Vec::new();
    let mut sql = format!("DELETE FROM {}", E::TABLE);
    sql.push_str(&where_clause::<E>(filter, &mut params)?);
    Ok(Statement { sql, params })
}

fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
