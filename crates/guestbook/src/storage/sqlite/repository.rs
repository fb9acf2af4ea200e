//! Generic SQLite repository.

use std::marker::PhantomData;

use async_trait::async_trait;
use guestbook_core::storage::{
    count_statement, delete_statement, insert_statement, select_statement, update_statement,
    Entity, Filter, Repository, Result, Sort, Transaction,
};
use guestbook_core::RequestContext;
use sqlx::SqlitePool;

use super::error::map_sqlx_error;
use super::executor::{self, QueryObserver};
use super::transaction::SqliteTransaction;
use super::SqliteDatabase;

/// Repository for any [`Entity`] over the primary/replica pools.
pub struct SqliteRepository<E> {
    db: SqliteDatabase,
    observer: QueryObserver,
    _marker: PhantomData<fn() -> E>,
}

impl<E> SqliteRepository<E> {
    pub fn new(db: SqliteDatabase) -> Self {
        let observer = QueryObserver {
            slow_query: db.slow_query,
        };
        Self {
            db,
            observer,
            _marker: PhantomData,
        }
    }

    fn reader(&self, use_master: bool) -> &SqlitePool {
        if use_master {
            &self.db.master
        } else {
            &self.db.slave
        }
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for SqliteRepository<E> {
    async fn begin_transaction(&self, ctx: &RequestContext) -> Result<Box<dyn Transaction<E>>> {
        let tx = self
            .db
            .master
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, E::NAME))?;
        tracing::debug!(request_id = %ctx.request_id, table = E::TABLE, "Transaction started");
        Ok(Box::new(SqliteTransaction::<E>::new(tx, self.observer)))
    }

    async fn count(&self, ctx: &RequestContext, filter: &Filter, use_master: bool) -> Result<u64> {
        let stmt = count_statement::<E>(filter)?;
        let fut = executor::count::<_, E>(self.reader(use_master), &stmt);
        self.observer.observe(ctx, "count", E::TABLE, &stmt, fut).await
    }

    async fn create(&self, ctx: &RequestContext, entity: &E) -> Result<()> {
        let stmt = insert_statement(entity)?;
        let fut = executor::execute::<_, E>(&self.db.master, &stmt);
        self.observer.observe(ctx, "create", E::TABLE, &stmt, fut).await?;
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, filter: &Filter) -> Result<()> {
        let stmt = delete_statement::<E>(filter)?;
        let fut = executor::execute::<_, E>(&self.db.master, &stmt);
        self.observer.observe(ctx, "delete", E::TABLE, &stmt, fut).await?;
        Ok(())
    }

    async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        take: u64,
        skip: u64,
        use_master: bool,
    ) -> Result<Vec<E>> {
        let stmt = select_statement::<E>(filter, sorts, Some(take), skip)?;
        let fut = executor::fetch_all::<_, E>(self.reader(use_master), &stmt);
        self.observer.observe(ctx, "find_all", E::TABLE, &stmt, fut).await
    }

    async fn find_one(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        use_master: bool,
    ) -> Result<E> {
        let stmt = select_statement::<E>(filter, sorts, Some(1), 0)?;
        let fut = executor::fetch_one::<_, E>(self.reader(use_master), &stmt);
        self.observer.observe(ctx, "find_one", E::TABLE, &stmt, fut).await
    }

    async fn update(&self, ctx: &RequestContext, entity: &E, filter: &Filter) -> Result<()> {
        let stmt = update_statement(entity, filter)?;
        let fut = executor::execute::<_, E>(&self.db.master, &stmt);
        self.observer.observe(ctx, "update", E::TABLE, &stmt, fut).await?;
        Ok(())
    }
}
