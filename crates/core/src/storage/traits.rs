use async_trait::async_trait;

use crate::context::RequestContext;

use super::{Entity, Filter, Result, Sort};

/// Generic repository over a primary (read-write) and replica (read-only) pool.
///
/// Reads go to the replica unless `use_master` is set.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Starts a transaction on the primary.
    async fn begin_transaction(&self, ctx: &RequestContext) -> Result<Box<dyn Transaction<E>>>;

    async fn count(&self, ctx: &RequestContext, filter: &Filter, use_master: bool) -> Result<u64>;

    async fn create(&self, ctx: &RequestContext, entity: &E) -> Result<()>;

    /// Physical delete of every row matching `filter`.
    async fn delete(&self, ctx: &RequestContext, filter: &Filter) -> Result<()>;

    async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        take: u64,
        skip: u64,
        use_master: bool,
    ) -> Result<Vec<E>>;

    /// Returns `RepositoryError::NotFound` when no row matches.
    async fn find_one(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        use_master: bool,
    ) -> Result<E>;

    /// Sets every mapped column on the rows matching `filter`.
    async fn update(&self, ctx: &RequestContext, entity: &E, filter: &Filter) -> Result<()>;
}

/// A transaction bound to a single primary connection.
///
/// Dropping the handle without calling [`Transaction::commit`] rolls back.
#[async_trait]
pub trait Transaction<E: Entity>: Send {
    async fn count(&mut self, ctx: &RequestContext, filter: &Filter) -> Result<u64>;

    async fn create(&mut self, ctx: &RequestContext, entity: &E) -> Result<()>;

    async fn delete(&mut self, ctx: &RequestContext, filter: &Filter) -> Result<()>;

    async fn find_all(
        &mut self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        take: u64,
        skip: u64,
    ) -> Result<Vec<E>>;

    async fn find_one(&mut self, ctx: &RequestContext, filter: &Filter, sorts: &[Sort])
        -> Result<E>;

    async fn update(&mut self, ctx: &RequestContext, entity: &E, filter: &Filter) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
