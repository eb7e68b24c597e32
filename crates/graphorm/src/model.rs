//! Model traits.
//!
//! Application structs implement [`Model`]. The finders are generic over it,
//! while association resolution works through the object-safe [`Entity`]
//! (one loaded record) and [`Slot`] (a field an association writes into:
//! `Option<M>` for single-valued relations, `Vec<M>` for multi-valued ones).

use crate::associations::Association;
use crate::error::OrmResult;
use crate::query::Query;
use crate::row::FromRow;
use crate::value::Value;
use async_trait::async_trait;

/// Static description of a model's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMeta {
    /// Singular snake_case model name, used to derive foreign keys (`user` → `user_id`).
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Columns selected by default. Empty selects `table.*`.
    pub columns: &'static [&'static str],
}

impl ModelMeta {
    /// `<table>.<pk> = ?`
    pub fn where_id(&self) -> String {
        format!("{}.{} = ?", self.table, self.primary_key)
    }

    /// Conventional foreign-key column pointing at this model.
    pub fn foreign_key(&self) -> String {
        format!("{}_id", self.name)
    }
}

/// A table-backed application struct.
///
/// ```ignore
/// impl Model for User {
///     const META: &'static ModelMeta = &ModelMeta {
///         name: "user",
///         table: "users",
///         primary_key: "id",
///         columns: &["id", "name", "created_at"],
///     };
///
///     fn primary_key(&self) -> Value {
///         self.id.into()
///     }
///
///     fn associations(&mut self) -> Vec<Association<'_>> {
///         vec![
///             Association::has_many("books", Self::META, self.id, &mut self.books),
///             Association::has_one("profile", Self::META, self.id, &mut self.profile),
///         ]
///     }
/// }
/// ```
pub trait Model: FromRow + Send + Sync + 'static {
    const META: &'static ModelMeta;

    fn primary_key(&self) -> Value;

    /// Post-fetch hook, called once for every record a finder materializes.
    fn after_find(&mut self) -> OrmResult<()> {
        Ok(())
    }

    /// Declared relations, in the order they should be resolved.
    fn associations(&mut self) -> Vec<Association<'_>> {
        Vec::new()
    }
}

/// Object-safe view of a loaded record.
///
/// Method names differ from [`Model`]'s so both traits can be in scope.
pub trait Entity: Send {
    fn meta(&self) -> &'static ModelMeta;
    /// Primary-key value, as reported in association logs.
    fn key(&self) -> Value;
    fn declared_associations(&mut self) -> Vec<Association<'_>>;
}

impl<M: Model> Entity for M {
    fn meta(&self) -> &'static ModelMeta {
        M::META
    }

    fn key(&self) -> Value {
        Model::primary_key(self)
    }

    fn declared_associations(&mut self) -> Vec<Association<'_>> {
        Model::associations(self)
    }
}

/// How many records an association target holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multi,
}

/// A field that an association populates.
#[async_trait]
pub trait Slot: Send {
    fn meta(&self) -> &'static ModelMeta;

    fn cardinality(&self) -> Cardinality;

    /// Run `query` and store the result, replacing the current contents.
    ///
    /// Single-valued slots are cleared first and stay `None` when no row matches.
    async fn fetch(&mut self, query: Query<'_>) -> OrmResult<()>;

    /// The records currently held.
    fn entities(&mut self) -> Vec<&mut dyn Entity>;
}

#[async_trait]
impl<M: Model> Slot for Option<M> {
    fn meta(&self) -> &'static ModelMeta {
        M::META
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::Single
    }

    async fn fetch(&mut self, mut query: Query<'_>) -> OrmResult<()> {
        *self = None;
        *self = query.first_or_none::<M>().await?;
        Ok(())
    }

    fn entities(&mut self) -> Vec<&mut dyn Entity> {
        self.iter_mut().map(|m| m as &mut dyn Entity).collect()
    }
}

#[async_trait]
impl<M: Model> Slot for Vec<M> {
    fn meta(&self) -> &'static ModelMeta {
        M::META
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::Multi
    }

    async fn fetch(&mut self, mut query: Query<'_>) -> OrmResult<()> {
        *self = query.all::<M>().await?;
        Ok(())
    }

    fn entities(&mut self) -> Vec<&mut dyn Entity> {
        self.iter_mut().map(|m| m as &mut dyn Entity).collect()
    }
}
