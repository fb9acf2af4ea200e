//! Filter and sort model used to build parameterised statements.
//!
//! A [`Filter`] is a logic node (AND/OR) over conditions and nested filters.
//! It never holds SQL text; rendering happens in [`super::sql`].

use uuid::Uuid;

/// A bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring match; the value is wrapped in `%…%`.
    Like,
    IsNull,
    IsNotNull,
}

/// How the clauses of a filter are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Condition(Condition),
    Group(Filter),
}

/// A tree of conditions joined by a single logic operator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub logic: Logic,
    pub clauses: Vec<Clause>,
}

impl Filter {
    /// An empty AND filter; renders to no WHERE clause.
    pub fn all() -> Self {
        Self {
            logic: Logic::And,
            clauses: Vec::new(),
        }
    }

    /// An empty OR filter.
    pub fn any() -> Self {
        Self {
            logic: Logic::Or,
            clauses: Vec::new(),
        }
    }

    pub fn condition(mut self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Condition(Condition {
            field: field.to_string(),
            operator,
            value: value.into(),
        }));
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.condition(field, Operator::Eq, value)
    }

    pub fn like(self, field: &str, value: impl Into<Value>) -> Self {
        self.condition(field, Operator::Like, value)
    }

    pub fn is_null(self, field: &str) -> Self {
        self.condition(field, Operator::IsNull, Value::Null)
    }

    pub fn is_not_null(self, field: &str) -> Self {
        self.condition(field, Operator::IsNotNull, Value::Null)
    }

    /// Nests another filter; empty groups are dropped.
    pub fn group(mut self, filter: Filter) -> Self {
        if !filter.is_empty() {
            self.clauses.push(Clause::Group(filter));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}
