//! Recursive association resolution.
//!
//! For every record, the requested associations are discovered, each one is
//! fetched with a fresh query constrained to the owner, and nested paths
//! (`"books.writers"`) are then resolved on whatever was loaded. Resolution is
//! sequential and depth-first; the first failure aborts everything after it.
//!
//! A single-valued association that matches no row stays `None`. Every
//! failure, nested ones and `after_find` errors included, is returned
//! unchanged.

use crate::associations::{discover, Association};
use crate::connection::Connection;
use crate::error::OrmResult;
use crate::model::Entity;
use crate::query::Query;
use std::future::Future;
use std::pin::Pin;
use tracing::Instrument;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolve `fields` (every association when empty) on each entity in turn.
pub(crate) fn eager_associations<'a>(
    conn: &'a Connection,
    entities: Vec<&'a mut dyn Entity>,
    fields: &'a [String],
) -> BoxFuture<'a, OrmResult<()>> {
    let span = tracing::debug_span!("eager_associations", records = entities.len(), ?fields);
    Box::pin(
        async move {
            for entity in entities {
                resolve_entity(conn, entity, fields).await?;
            }
            OrmResult::Ok(())
        }
        .instrument(span),
    )
}

async fn resolve_entity(conn: &Connection, entity: &mut dyn Entity, fields: &[String]) -> OrmResult<()> {
    let owner = entity.meta().table;
    let owner_id = entity.key();
    for mut association in discover(entity, fields)? {
        if association.is_skipped() {
            tracing::trace!(owner, field = association.field(), "association skipped");
            continue;
        }
        tracing::debug!(
            owner,
            owner_id = %owner_id,
            field = association.field(),
            kind = association.kind().name(),
            "loading association"
        );

        let query = association_query(conn, &association);
        association.target().fetch(query).await?;

        let inner = std::mem::take(&mut association.inner);
        for path in inner {
            let fields = [path];
            eager_associations(conn, association.target().entities(), &fields).await?;
        }
    }
    Ok(())
}

/// Target query for one association: its constraint and optional ordering,
/// rendered once and handed to the slot as raw SQL.
fn association_query<'c>(conn: &'c Connection, association: &Association<'_>) -> Query<'c> {
    let (condition, args) = association.constraint();
    let mut query = Query::new(conn).where_clause(condition, args);
    if let Some(order) = association.order_clause() {
        query = query.order(order);
    }
    let (sql, args) = query.to_sql_for(association.target_meta());
    Query::new(conn).raw_query(sql, args)
}
