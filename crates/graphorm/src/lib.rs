//! # graphorm
//!
//! Record finders and recursive association loading on top of `tokio-postgres`.
//!
//! ## Finders
//!
//! ```ignore
//! use graphorm::{Connection, create_pool};
//!
//! let conn = Connection::postgres(create_pool(&database_url)?);
//!
//! let user: User = conn.find("42").await?;
//! let newest: User = conn.q().where_clause("active = ?", [true]).last().await?;
//! let exists = conn.q().where_clause("email = ?", [email]).exists::<User>().await?;
//!
//! let mut q = conn.q().order("name ASC").paginate(2, 20);
//! let page: Vec<User> = q.all().await?;
//! let total_pages = q.paginator().map(|p| p.total_pages);
//! ```
//!
//! ## Associations
//!
//! Models declare their relations in [`Model::associations`]. An eager load
//! resolves them after the main fetch, recursing through dotted paths:
//!
//! ```ignore
//! let users: Vec<User> = conn.eager(["books.writers", "profile"]).all().await?;
//!
//! let mut user: User = conn.first().await?;
//! conn.load(&mut user, &[]).await?; // every association
//! ```
//!
//! ## Logging
//!
//! Every statement is emitted as a `debug` event on the `graphorm.sql`
//! target; slow queries (see [`ConnectionConfig`]) are reported at `warn`.

pub mod aggregate;
pub mod associations;
pub mod config;
pub mod connection;
pub mod dialect;
mod eager;
pub mod error;
pub mod finders;
pub mod model;
pub mod paginator;
pub mod query;
pub mod row;
pub mod store;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
mod test_support;

pub use aggregate::{count_sql, exists_sql, strip_trailing_limit};
pub use associations::{Association, AssociationKind, discover};
pub use config::ConnectionConfig;
pub use connection::Connection;
pub use dialect::{Dialect, Postgres, SelectParts};
pub use error::{OrmError, OrmResult};
pub use finders::normalize_id;
pub use model::{Cardinality, Entity, Model, ModelMeta, Slot};
pub use paginator::Paginator;
pub use query::{EagerLoad, Query};
pub use row::{FromRow, Row, RowCount};
pub use store::Store;
pub use value::{FromValue, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_manager_config};
