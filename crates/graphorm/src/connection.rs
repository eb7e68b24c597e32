//! Shared execution context.

use crate::config::ConnectionConfig;
use crate::dialect::{Dialect, Postgres};
use crate::error::{OrmError, OrmResult};
use crate::query::Query;
use crate::row::Row;
use crate::store::Store;
use crate::value::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// A store handle, a dialect and execution settings.
///
/// Cloning is cheap; finders only read from a connection, so one connection
/// can serve many queries concurrently. Each logical finder call should own
/// its own [`Query`].
#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn Store>,
    dialect: Arc<dyn Dialect>,
    config: ConnectionConfig,
}

impl Connection {
    pub fn new<S, D>(store: S, dialect: D) -> Self
    where
        S: Store + 'static,
        D: Dialect + 'static,
    {
        Self::from_arcs(Arc::new(store), Arc::new(dialect))
    }

    /// A connection using the [`Postgres`] dialect.
    pub fn postgres<S: Store + 'static>(store: S) -> Self {
        Self::new(store, Postgres)
    }

    pub fn from_arcs(store: Arc<dyn Store>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            store,
            dialect,
            config: ConnectionConfig::default(),
        }
    }

    /// Set the execution configuration.
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Start a new query.
    pub fn q(&self) -> Query<'_> {
        Query::new(self)
    }

    pub(crate) async fn fetch_all(
        &self,
        op: &'static str,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Vec<Row>> {
        self.run(op, sql, args, self.store.fetch_all(sql, args)).await
    }

    pub(crate) async fn fetch_one(
        &self,
        op: &'static str,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Row> {
        self.run(op, sql, args, self.store.fetch_one(sql, args)).await
    }

    pub(crate) async fn get_scalar(
        &self,
        op: &'static str,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Value> {
        self.run(op, sql, args, self.store.get_scalar(sql, args)).await
    }

    async fn run<T, F>(&self, op: &'static str, sql: &str, args: &[Value], future: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>> + Send,
    {
        tracing::debug!(
            target: "graphorm.sql",
            op,
            dialect = self.dialect.name(),
            param_count = args.len(),
            sql = %self.truncate_sql(sql),
        );

        let start = Instant::now();
        let result = match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(OrmError::Timeout(timeout)),
            },
            None => future.await,
        };
        let duration = start.elapsed();

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                tracing::warn!(
                    target: "graphorm.sql",
                    op,
                    duration_ms = duration.as_millis() as u64,
                    sql = %self.truncate_sql(sql),
                    "slow query"
                );
            }
        }
        if let Err(err) = &result {
            if !err.is_not_found() {
                tracing::debug!(target: "graphorm.sql", op, error = %err, "query failed");
            }
        }
        result
    }

    fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
