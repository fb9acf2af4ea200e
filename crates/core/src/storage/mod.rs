mod entity;
mod error;
mod query;
mod sql;
mod traits;

pub use entity::{Entity, Row};
pub use error::{RepositoryError, Result};
pub use query::{Clause, Condition, Filter, Logic, Operator, Sort, SortDirection, Value};
pub use sql::{
    count_statement, delete_statement, insert_statement, select_statement, update_statement,
    Statement,
};
pub use traits::{Repository, Transaction};
