//! Association descriptors and discovery.
//!
//! Models declare their relations in [`Model::associations`](crate::Model::associations);
//! [`discover`] narrows that list to the fields an eager load asked for and
//! attaches the nested field paths each association must resolve next.

use crate::error::{OrmError, OrmResult};
use crate::model::{Cardinality, Entity, ModelMeta, Slot};
use crate::value::Value;
use std::fmt;

/// Relation kind plus the data its constraint needs.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationKind {
    /// Target row carries `<owner>_id` pointing at the owner.
    HasOne {
        owner: &'static ModelMeta,
        owner_id: Value,
    },
    /// Target rows carry `<owner>_id` pointing at the owner.
    HasMany {
        owner: &'static ModelMeta,
        owner_id: Value,
    },
    /// The owner carries the target's primary key.
    BelongsTo { foreign_key_value: Value },
    /// Owner and target are linked through `join_table`.
    ManyToMany {
        owner: &'static ModelMeta,
        owner_id: Value,
        join_table: &'static str,
    },
}

impl AssociationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HasOne { .. } => "has_one",
            Self::HasMany { .. } => "has_many",
            Self::BelongsTo { .. } => "belongs_to",
            Self::ManyToMany { .. } => "many_to_many",
        }
    }
}

/// A declared relation of one loaded record, bound to the field it fills.
pub struct Association<'a> {
    pub(crate) field: &'static str,
    pub(crate) kind: AssociationKind,
    pub(crate) target: &'a mut dyn Slot,
    foreign_key: Option<&'static str>,
    order_by: Option<String>,
    skipped: bool,
    pub(crate) inner: Vec<String>,
}

impl<'a> Association<'a> {
    fn new(field: &'static str, kind: AssociationKind, target: &'a mut dyn Slot) -> Self {
        Self {
            field,
            kind,
            target,
            foreign_key: None,
            order_by: None,
            skipped: false,
            inner: Vec::new(),
        }
    }

    /// `field` is filled with the single row whose `<owner>_id` matches `owner_id`.
    pub fn has_one<M: crate::Model>(
        field: &'static str,
        owner: &'static ModelMeta,
        owner_id: impl Into<Value>,
        target: &'a mut Option<M>,
    ) -> Self {
        let kind = AssociationKind::HasOne {
            owner,
            owner_id: owner_id.into(),
        };
        Self::new(field, kind, target)
    }

    /// `field` is filled with every row whose `<owner>_id` matches `owner_id`.
    pub fn has_many<M: crate::Model>(
        field: &'static str,
        owner: &'static ModelMeta,
        owner_id: impl Into<Value>,
        target: &'a mut Vec<M>,
    ) -> Self {
        let kind = AssociationKind::HasMany {
            owner,
            owner_id: owner_id.into(),
        };
        Self::new(field, kind, target)
    }

    /// `field` is filled with the row whose primary key equals `foreign_key_value`.
    ///
    /// Skipped automatically when the foreign key is unset (null or zero).
    pub fn belongs_to<M: crate::Model>(
        field: &'static str,
        foreign_key_value: impl Into<Value>,
        target: &'a mut Option<M>,
    ) -> Self {
        let foreign_key_value = foreign_key_value.into();
        let skipped = foreign_key_value.is_zero();
        let mut association = Self::new(
            field,
            AssociationKind::BelongsTo { foreign_key_value },
            target,
        );
        association.skipped = skipped;
        association
    }

    /// `field` is filled with the rows linked to the owner through `join_table`.
    pub fn many_to_many<M: crate::Model>(
        field: &'static str,
        owner: &'static ModelMeta,
        owner_id: impl Into<Value>,
        join_table: &'static str,
        target: &'a mut Vec<M>,
    ) -> Self {
        let kind = AssociationKind::ManyToMany {
            owner,
            owner_id: owner_id.into(),
            join_table,
        };
        Self::new(field, kind, target)
    }

    /// Override the owner-side foreign-key column.
    pub fn foreign_key(mut self, column: &'static str) -> Self {
        self.foreign_key = Some(column);
        self
    }

    /// Order the associated rows.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    /// Exclude this association from eager loading.
    pub fn skip(mut self) -> Self {
        self.skipped = true;
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn kind(&self) -> &AssociationKind {
        &self.kind
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn cardinality(&self) -> Cardinality {
        self.target.cardinality()
    }

    /// Shape of the rows this association loads.
    pub fn target_meta(&self) -> &'static ModelMeta {
        self.target.meta()
    }

    /// The field to populate.
    pub fn target(&mut self) -> &mut dyn Slot {
        &mut *self.target
    }

    /// Non-empty ORDER BY fragment, if the association is sortable.
    pub fn order_clause(&self) -> Option<&str> {
        self.order_by.as_deref().filter(|clause| !clause.trim().is_empty())
    }

    /// Nested field paths to resolve on the target once it is loaded.
    pub fn inner_associations(&self) -> &[String] {
        &self.inner
    }

    /// WHERE condition (with `?` placeholders) and arguments restricting the
    /// target query to rows related to the owner.
    pub fn constraint(&self) -> (String, Vec<Value>) {
        match &self.kind {
            AssociationKind::HasOne { owner, owner_id }
            | AssociationKind::HasMany { owner, owner_id } => {
                let column = self
                    .foreign_key
                    .map(str::to_string)
                    .unwrap_or_else(|| owner.foreign_key());
                (format!("{column} = ?"), vec![owner_id.clone()])
            }
            AssociationKind::BelongsTo { foreign_key_value } => {
                let target = self.target.meta();
                (
                    format!("{} = ?", target.primary_key),
                    vec![foreign_key_value.clone()],
                )
            }
            AssociationKind::ManyToMany {
                owner,
                owner_id,
                join_table,
            } => {
                let target = self.target.meta();
                let owner_column = self
                    .foreign_key
                    .map(str::to_string)
                    .unwrap_or_else(|| owner.foreign_key());
                (
                    format!(
                        "{} in (select {} from {} where {} = ?)",
                        target.primary_key,
                        target.foreign_key(),
                        join_table,
                        owner_column
                    ),
                    vec![owner_id.clone()],
                )
            }
        }
    }
}

impl fmt::Debug for Association<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("field", &self.field)
            .field("kind", &self.kind.name())
            .field("target", &self.target.meta().table)
            .field("skipped", &self.skipped)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Split `"books.writers.address"` into `("books", Some("writers.address"))`.
fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) if !rest.trim().is_empty() => (head.trim(), Some(rest.trim())),
        Some((head, _)) => (head.trim(), None),
        None => (path.trim(), None),
    }
}

/// Associations of `entity` selected by `fields`.
///
/// With no fields every declared association is returned. Otherwise each
/// field path selects the association named by its first segment and the
/// remainder becomes one of that association's inner paths. Results keep the
/// model's declaration order.
pub fn discover<'a>(entity: &'a mut dyn Entity, fields: &[String]) -> OrmResult<Vec<Association<'a>>> {
    let meta = entity.meta();
    let mut declared = entity.declared_associations();

    let requested: Vec<(&str, Option<&str>)> = fields
        .iter()
        .map(|f| split_path(f))
        .filter(|(head, _)| !head.is_empty())
        .collect();
    if requested.is_empty() {
        return Ok(declared);
    }

    for (head, _) in &requested {
        if !declared.iter().any(|a| a.field == *head) {
            return Err(OrmError::discovery(format!(
                "could not find association '{}' on model '{}'",
                head, meta.name
            )));
        }
    }

    declared.retain(|a| requested.iter().any(|(head, _)| *head == a.field));
    for association in &mut declared {
        for (head, rest) in &requested {
            if *head != association.field {
                continue;
            }
            if let Some(rest) = rest {
                if !association.inner.iter().any(|existing| existing == rest) {
                    association.inner.push(rest.to_string());
                }
            }
        }
    }
    Ok(declared)
}
