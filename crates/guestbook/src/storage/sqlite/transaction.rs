use std::marker::PhantomData;

use async_trait::async_trait;
use guestbook_core::storage::{
    count_statement, delete_statement, insert_statement, select_statement, update_statement,
    Entity, Filter, RepositoryError, Result, Sort, Transaction,
};
use guestbook_core::RequestContext;
use sqlx::Sqlite;

use super::executor::{self, QueryObserver};

/// A transaction on the primary pool.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
pub struct SqliteTransaction<E> {
    tx: sqlx::Transaction<'static, Sqlite>,
    observer: QueryObserver,
    _marker: PhantomData<fn() -> E>,
}

impl<E> SqliteTransaction<E> {
    pub fn new(tx: sqlx::Transaction<'static, Sqlite>, observer: QueryObserver) -> Self {
        Self {
            tx,
            observer,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> Transaction<E> for SqliteTransaction<E> {
    async fn count(&mut self, ctx: &RequestContext, filter: &Filter) -> Result<u64> {
        let stmt = count_statement::<E>(filter)?;
        let fut = executor::count::<_, E>(&mut *self.tx, &stmt);
        self.observer.observe(ctx, "count", E::TABLE, &stmt, fut).await
    }

    async fn create(&mut self, ctx: &RequestContext, entity: &E) -> Result<()> {
        let stmt = insert_statement(entity)?;
        let fut = executor::execute::<_, E>(&mut *self.tx, &stmt);
        self.observer.observe(ctx, "create", E::TABLE, &stmt, fut).await?;
        Ok(())
    }

    async fn delete(&mut self, ctx: &RequestContext, filter: &Filter) -> Result<()> {
        let stmt = delete_statement::<E>(filter)?;
        let fut = executor::execute::<_, E>(&mut *self.tx, &stmt);
        self.observer.observe(ctx, "delete", E::TABLE, &stmt, fut).await?;
        Ok(())
    }

    async fn find_all(
        &mut self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        take: u64,
        skip: u64,
    ) -> Result<Vec<E>> {
        let stmt = select_statement::<E>(filter, sorts, Some(take), skip)?;
        let fut = executor::fetch_all::<_, E>(&mut *self.tx, &stmt);
        self.observer.observe(ctx, "find_all", E::TABLE, &stmt, fut).await
    }

    async fn find_one(
        &mut self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
    ) -> Result<E> {
        let stmt = select_statement::<E>(filter, sorts, Some(1), 0)?;
        let fut = executor::fetch_one::<_, E>(&mut *self.tx, &stmt);
        self.observer.observe(ctx, "find_one", E::TABLE, &stmt, fut).await
    }

    async fn update(&mut self, ctx: &RequestContext, entity: &E, filter: &Filter) -> Result<()> {
        let stmt = update_statement(entity, filter)?;
        let fut = executor::execute::<_, E>(&mut *self.tx, &stmt);
        self.observer.observe(ctx, "update", E::TABLE, &stmt, fut).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(format!("commit failed: {e}")))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| RepositoryError::QueryFailed(format!("rollback failed: {e}")))
    }
}
