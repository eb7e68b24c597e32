//! Finder operations: `find`, `first`, `last`, `all`, `exists`, `count`, `load`.
//!
//! Every finder is available on a [`Query`] (for chaining) and on a
//! [`Connection`], which opens a fresh query.

use crate::aggregate;
use crate::connection::Connection;
use crate::eager::eager_associations;
use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, Model};
use crate::query::Query;
use crate::row::{FromRow, RowCount};
use crate::value::{FromValue, Value};
use tracing::instrument;

/// Ordering forced by [`Query::last`].
pub const LAST_ORDER: &str = "created_at DESC, id DESC";

/// Coerce a string primary key to an integer where it looks like one.
///
/// Non-empty strings are parsed as `i64` unless they start with `'0'` and are
/// longer than one character (leading-zero identifiers stay strings).
/// Strings that fail to parse are kept as they are.
pub fn normalize_id(id: Value) -> Value {
    match id {
        Value::Text(s) if !s.is_empty() && (!s.starts_with('0') || s.len() == 1) => {
            match s.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Text(s),
            }
        }
        other => other,
    }
}

impl<'c> Query<'c> {
    /// First record with the given primary key.
    ///
    /// ```ignore
    /// let user: User = conn.q().find("42").await?;
    /// ```
    #[instrument(level = "debug", name = "find", skip_all, fields(table = M::META.table))]
    pub async fn find<M: Model>(&mut self, id: impl Into<Value>) -> OrmResult<M> {
        let id = normalize_id(id.into());
        self.push_condition(M::META.where_id(), vec![id]);
        self.first::<M>().await
    }

    /// First record matching the query.
    ///
    /// Returns [`OrmError::NotFound`] when nothing matches.
    #[instrument(level = "debug", name = "first", skip_all, fields(table = M::META.table))]
    pub async fn first<M: Model>(&mut self) -> OrmResult<M> {
        self.set_limit(1);
        self.fetch_single::<M>("first").await
    }

    /// Most recently created record matching the query.
    ///
    /// Any previous ORDER clause is replaced by `created_at DESC, id DESC`.
    #[instrument(level = "debug", name = "last", skip_all, fields(table = M::META.table))]
    pub async fn last<M: Model>(&mut self) -> OrmResult<M> {
        self.set_limit(1);
        self.replace_order(LAST_ORDER);
        self.fetch_single::<M>("last").await
    }

    /// Like [`Query::first`], but no matching row is `Ok(None)`.
    pub(crate) async fn first_or_none<M: Model>(&mut self) -> OrmResult<Option<M>> {
        self.set_limit(1);
        self.fetch_optional::<M>("first").await
    }

    async fn fetch_single<M: Model>(&mut self, op: &'static str) -> OrmResult<M> {
        self.fetch_optional::<M>(op)
            .await?
            .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
    }

    async fn fetch_optional<M: Model>(&mut self, op: &'static str) -> OrmResult<Option<M>> {
        let (sql, args) = self.to_sql::<M>();
        let rows = self.connection().fetch_all(op, &sql, &args).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let mut model = M::from_row(row)?;
        model.after_find()?;

        if let Some(eager) = self.eager.take() {
            let entity: &mut dyn Entity = &mut model;
            eager_associations(self.connection(), vec![entity], &eager.fields).await?;
        }
        Ok(Some(model))
    }

    /// Every record matching the query.
    ///
    /// With a paginator attached, page totals are computed with an extra
    /// `count` and can be read back through [`Query::paginator`].
    #[instrument(level = "debug", name = "all", skip_all, fields(table = M::META.table))]
    pub async fn all<M: Model>(&mut self) -> OrmResult<Vec<M>> {
        let mut models = self
            .fetch_many::<M>()
            .await
            .map_err(|e| e.context("unable to fetch records"))?;

        if let Some(eager) = self.eager.take() {
            let entities: Vec<&mut dyn Entity> =
                models.iter_mut().map(|m| m as &mut dyn Entity).collect();
            eager_associations(self.connection(), entities, &eager.fields).await?;
        }
        Ok(models)
    }

    async fn fetch_many<M: Model>(&mut self) -> OrmResult<Vec<M>> {
        let (sql, args) = self.to_sql::<M>();
        let rows = self.connection().fetch_all("all", &sql, &args).await?;
        let mut models = rows.iter().map(M::from_row).collect::<OrmResult<Vec<_>>>()?;
        self.paginate_model::<M>(models.len()).await?;
        for model in &mut models {
            model.after_find()?;
        }
        Ok(models)
    }

    async fn paginate_model<M: Model>(&mut self, current_entries_size: usize) -> OrmResult<()> {
        if self.paginator.is_none() {
            return Ok(());
        }
        let total = self.count::<M>().await?;
        if let Some(paginator) = self.paginator.as_mut() {
            paginator.record(total, current_entries_size as u64);
        }
        Ok(())
    }

    /// Whether any record matches the query. The query itself is not changed.
    #[instrument(level = "debug", name = "exists", skip_all, fields(table = M::META.table))]
    pub async fn exists<M: Model>(&self) -> OrmResult<bool> {
        let (sql, args) = self.aggregate_copy().to_sql::<M>();
        let sql = aggregate::exists_sql(&sql);
        let value = self.connection().get_scalar("exists", &sql, &args).await?;
        bool::from_value(&value).map_err(|message| OrmError::decode("exists", message))
    }

    /// Number of records matching the query. The query itself is not changed.
    pub async fn count<M: Model>(&self) -> OrmResult<u64> {
        self.count_by_field::<M>("*").await
    }

    /// `COUNT(<field>)` over the records matching the query.
    #[instrument(level = "debug", name = "count", skip_all, fields(table = M::META.table, field = %field))]
    pub async fn count_by_field<M: Model>(&self, field: &str) -> OrmResult<u64> {
        let (sql, args) = self.aggregate_copy().to_sql::<M>();
        let sql = aggregate::count_sql(&sql, field);
        let row = self.connection().fetch_one("count", &sql, &args).await?;
        let RowCount { count } = RowCount::from_row(&row)?;
        u64::try_from(count).map_err(|_| OrmError::decode("row_count", format!("negative count {count}")))
    }

    /// Resolve the associations named in `fields` (all when empty) for an
    /// already loaded record. The query's own clauses are not used.
    ///
    /// See [`Connection::load`].
    pub async fn load<M: Model>(&self, model: &mut M, fields: &[String]) -> OrmResult<()> {
        self.connection().load(model, fields).await
    }

    /// [`Query::load`] for every record of a slice, in order. The first
    /// failure stops the remaining records.
    pub async fn load_many<M: Model>(&self, models: &mut [M], fields: &[String]) -> OrmResult<()> {
        self.connection().load_many(models, fields).await
    }
}

impl Connection {
    /// See [`Query::find`].
    pub async fn find<M: Model>(&self, id: impl Into<Value>) -> OrmResult<M> {
        self.q().find(id).await
    }

    /// See [`Query::first`].
    pub async fn first<M: Model>(&self) -> OrmResult<M> {
        self.q().first().await
    }

    /// See [`Query::last`].
    pub async fn last<M: Model>(&self) -> OrmResult<M> {
        self.q().last().await
    }

    /// See [`Query::all`].
    pub async fn all<M: Model>(&self) -> OrmResult<Vec<M>> {
        self.q().all().await
    }

    /// See [`Query::exists`].
    pub async fn exists<M: Model>(&self) -> OrmResult<bool> {
        self.q().exists::<M>().await
    }

    /// See [`Query::count`].
    pub async fn count<M: Model>(&self) -> OrmResult<u64> {
        self.q().count::<M>().await
    }

    /// See [`Query::count_by_field`].
    pub async fn count_by_field<M: Model>(&self, field: &str) -> OrmResult<u64> {
        self.q().count_by_field::<M>(field).await
    }

    /// A new query restricted to `fields`.
    pub fn select<I, S>(&self, fields: I) -> Query<'_>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.q().select(fields)
    }

    /// A new query that eager-loads `fields` (every association when empty).
    pub fn eager<I, S>(&self, fields: I) -> Query<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.q().eager(fields)
    }

    /// Resolve the associations named in `fields` (all when empty) for an
    /// already loaded record.
    ///
    /// ```ignore
    /// let mut user: User = conn.first().await?;
    /// conn.load(&mut user, &["books".into()]).await?;
    /// ```
    #[instrument(level = "debug", name = "load", skip_all, fields(table = M::META.table))]
    pub async fn load<M: Model>(&self, model: &mut M, fields: &[String]) -> OrmResult<()> {
        let entity: &mut dyn Entity = model;
        eager_associations(self, vec![entity], fields).await
    }

    /// [`Connection::load`] for every record of a slice.
    #[instrument(level = "debug", name = "load_many", skip_all, fields(table = M::META.table))]
    pub async fn load_many<M: Model>(&self, models: &mut [M], fields: &[String]) -> OrmResult<()> {
        let entities: Vec<&mut dyn Entity> =
            models.iter_mut().map(|m| m as &mut dyn Entity).collect();
        eager_associations(self, entities, fields).await
    }
}
