//! Statement execution shared by pools and transactions.
//!
//! Every helper is generic over `sqlx::Executor`, so `&SqlitePool` and
//! `&mut SqliteConnection` (inside a transaction) run the same code.

use std::future::Future;
use std::time::{Duration, Instant};

use guestbook_core::storage::{Entity, RepositoryError, Result, Statement};
use guestbook_core::RequestContext;
use sqlx::{Row as _, Sqlite};
use tracing::Instrument;

use super::conversions::{bind_values, to_row};
use super::error::map_sqlx_error;

/// Times statements and warns when one exceeds the threshold.
#[derive(Debug, Clone, Copy)]
pub struct QueryObserver {
    pub slow_query: Duration,
}

impl QueryObserver {
    pub async fn observe<T, F>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        table: &'static str,
        stmt: &Statement,
        fut: F,
    ) -> T
    where
        F: Future<Output = T>,
    {
        let span = tracing::debug_span!(
            "db.query",
            request_id = %ctx.request_id,
            operation,
            table,
        );
        let started = Instant::now();
        let out = fut.instrument(span).await;
        let elapsed = started.elapsed();

        if elapsed >= self.slow_query {
            tracing::warn!(
                request_id = %ctx.request_id,
                operation,
                table,
                sql = %stmt.sql,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_query.as_millis() as u64,
                "slow query"
            );
        } else {
            tracing::trace!(operation, table, elapsed_ms = elapsed.as_millis() as u64, "query done");
        }
        out
    }
}

pub async fn execute<'c, X, E>(executor: X, stmt: &Statement) -> Result<u64>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
    E: Entity,
{
    let result = bind_values(sqlx::query(&stmt.sql), &stmt.params)
        .execute(executor)
        .await
        .map_err(|e| map_sqlx_error(e, E::NAME))?;
    Ok(result.rows_affected())
}

pub async fn count<'c, X, E>(executor: X, stmt: &Statement) -> Result<u64>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
    E: Entity,
{
    let row = bind_values(sqlx::query(&stmt.sql), &stmt.params)
        .fetch_one(executor)
        .await
        .map_err(|e| map_sqlx_error(e, E::NAME))?;
    let count: i64 = row.try_get(0).map_err(|e| map_sqlx_error(e, E::NAME))?;
    u64::try_from(count).map_err(|_| RepositoryError::InvalidData(format!("negative count {count}")))
}

pub async fn fetch_all<'c, X, E>(executor: X, stmt: &Statement) -> Result<Vec<E>>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
    E: Entity,
{
    let rows = bind_values(sqlx::query(&stmt.sql), &stmt.params)
        .fetch_all(executor)
        .await
        .map_err(|e| map_sqlx_error(e, E::NAME))?;
    rows.iter()
        .map(|row| to_row(row).and_then(|row| E::from_row(&row)))
        .collect()
}

pub async fn fetch_one<'c, X, E>(executor: X, stmt: &Statement) -> Result<E>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
    E: Entity,
{
    let row = bind_values(sqlx::query(&stmt.sql), &stmt.params)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_sqlx_error(e, E::NAME))?
        .ok_or(RepositoryError::NotFound {
            entity_type: E::NAME,
        })?;
    E::from_row(&to_row(&row)?)
}
