use super::{RepositoryError, Result, Value};

/// Static table mapping for a persisted entity.
///
/// `to_values` must yield exactly one value per entry of `COLUMNS`, in order.
pub trait Entity: Sized + Send + Sync + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const PRIMARY_KEY: &'static str;
    /// Human name used in error messages.
    const NAME: &'static str;

    fn to_values(&self) -> Vec<Value>;

    fn from_row(row: &Row) -> Result<Self>;
}

/// A decoded result row, independent of the database driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| RepositoryError::Serialization(format!("missing column `{column}`")))
    }

    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)?
            .ok_or_else(|| RepositoryError::Serialization(format!("`{column}` is null")))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(RepositoryError::Serialization(format!(
                "`{column}` expected text, got {other:?}"
            ))),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64> {
        self.opt_integer(column)?
            .ok_or_else(|| RepositoryError::Serialization(format!("`{column}` is null")))
    }

    pub fn opt_integer(&self, column: &str) -> Result<Option<i64>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(*i)),
            Value::Bool(b) => Ok(Some(i64::from(*b))),
            other => Err(RepositoryError::Serialization(format!(
                "`{column}` expected integer, got {other:?}"
            ))),
        }
    }
}
