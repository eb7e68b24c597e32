//! Storage trait for executing rendered SQL.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use async_trait::async_trait;
use tokio_postgres::types::ToSql;

/// Executes already-rendered SQL against a backing database.
///
/// A `Store` only runs statements; rendering SQL text for a query is the job
/// of a [`Dialect`](crate::Dialect). Implementations exist for
/// `tokio_postgres::Client` and (with the `pool` feature) for
/// `deadpool_postgres::Pool`; tests can plug in an in-memory store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute a query and return all rows.
    async fn fetch_all(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>>;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`OrmError::NotFound`]
    /// - 1 or more rows: returns the first row
    async fn fetch_one(&self, sql: &str, args: &[Value]) -> OrmResult<Row> {
        let rows = self.fetch_all(sql, args).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
    }

    /// Execute an aggregate query and return the first column of the first row.
    async fn get_scalar(&self, sql: &str, args: &[Value]) -> OrmResult<Value> {
        let row = self.fetch_one(sql, args).await?;
        row.first_value()
            .cloned()
            .ok_or_else(|| OrmError::decode("?column?", "aggregate query returned no columns"))
    }
}

pub(crate) fn params_ref(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Store for tokio_postgres::Client {
    async fn fetch_all(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let params = params_ref(args);
        let rows = tokio_postgres::Client::query(self, sql, &params).await?;
        rows.iter().map(Row::from_pg).collect()
    }
}

#[cfg(feature = "pool")]
#[async_trait]
impl Store for deadpool_postgres::Pool {
    async fn fetch_all(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let client = self.get().await?;
        let params = params_ref(args);
        let rows = client.query(sql, &params).await?;
        rows.iter().map(Row::from_pg).collect()
    }
}
