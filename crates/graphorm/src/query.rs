//! Query descriptor and clause accumulation.
//!
//! ```ignore
//! let mut q = conn
//!     .q()
//!     .where_clause("name = ?", ["mark"])
//!     .order("created_at DESC")
//!     .paginate(2, 10)
//!     .eager(["books.writers"]);
//! let users: Vec<User> = q.all().await?;
//! let pages = q.paginator().map(|p| p.total_pages);
//! ```

use crate::connection::Connection;
use crate::dialect::SelectParts;
use crate::model::{Model, ModelMeta};
use crate::paginator::Paginator;
use crate::value::Value;

/// An eager-loading request: which associations to resolve after the fetch.
///
/// An empty field list resolves every declared association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EagerLoad {
    pub fields: Vec<String>,
}

/// A request against one [`Connection`], built with chained calls and run
/// by a terminal finder (`first`, `all`, `count`, ...).
#[derive(Debug, Clone)]
pub struct Query<'c> {
    conn: &'c Connection,
    conditions: Vec<String>,
    args: Vec<Value>,
    orders: Vec<String>,
    limit: Option<u64>,
    columns: Vec<String>,
    raw: Option<(String, Vec<Value>)>,
    pub(crate) paginator: Option<Paginator>,
    pub(crate) eager: Option<EagerLoad>,
}

impl<'c> Query<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            conditions: Vec::new(),
            args: Vec::new(),
            orders: Vec::new(),
            limit: None,
            columns: Vec::new(),
            raw: None,
            paginator: None,
            eager: None,
        }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Add a WHERE condition using `?` placeholders.
    ///
    /// Conditions are joined with `AND`.
    pub fn where_clause<I, V>(mut self, condition: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(condition.into());
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append an ORDER BY fragment.
    pub fn order(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        if !clause.trim().is_empty() {
            self.orders.push(clause);
        }
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Attach a [`Paginator`]; `all` will then also compute page totals.
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        self.paginator = Some(Paginator::new(page, per_page));
        self
    }

    /// Restrict the selected columns. Blank names are ignored.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            let field = field.as_ref().trim();
            if !field.is_empty() {
                self.columns.push(field.to_string());
            }
        }
        self
    }

    /// Run `sql` verbatim instead of building a SELECT.
    ///
    /// `?` placeholders are translated by the dialect; WHERE, ORDER and LIMIT
    /// clauses are ignored.
    pub fn raw_query<I, V>(mut self, sql: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.raw = Some((sql.into(), args.into_iter().map(Into::into).collect()));
        self
    }

    /// Resolve associations after the next terminal finder call.
    ///
    /// Fields are association names, optionally dotted to reach nested ones
    /// (`"books.writers"`). No fields means every association.
    pub fn eager<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eager = Some(EagerLoad {
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn paginator(&self) -> Option<&Paginator> {
        self.paginator.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn orders(&self) -> &[String] {
        &self.orders
    }

    pub fn is_eager(&self) -> bool {
        self.eager.is_some()
    }

    pub(crate) fn set_limit(&mut self, n: u64) {
        self.limit = Some(n);
    }

    pub(crate) fn replace_order(&mut self, clause: &str) {
        self.orders = vec![clause.to_string()];
    }

    pub(crate) fn push_condition(&mut self, condition: String, args: Vec<Value>) {
        self.conditions.push(condition);
        self.args.extend(args);
    }

    /// Copy suitable for an aggregate: no paginator, ORDER, LIMIT or eager request.
    pub(crate) fn aggregate_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.paginator = None;
        copy.orders.clear();
        copy.limit = None;
        copy.eager = None;
        copy
    }

    /// Render the statement for model `M`.
    pub fn to_sql<M: Model>(&self) -> (String, Vec<Value>) {
        self.to_sql_for(M::META)
    }

    /// Render the statement for a model shape.
    pub fn to_sql_for(&self, meta: &ModelMeta) -> (String, Vec<Value>) {
        let dialect = self.conn.dialect();
        if let Some((sql, args)) = &self.raw {
            return (dialect.translate(sql), args.clone());
        }

        let (limit, offset) = match &self.paginator {
            Some(p) => (Some(p.per_page), Some(p.offset)),
            None => (self.limit, None),
        };
        let sql = dialect.select_sql(
            meta,
            SelectParts {
                columns: &self.columns,
                conditions: &self.conditions,
                orders: &self.orders,
                limit,
                offset,
            },
        );
        (sql, self.args.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    const USERS: ModelMeta = ModelMeta {
        name: "user",
        table: "users",
        primary_key: "id",
        columns: &["id", "name"],
    };

    #[test]
    fn select_drops_blank_columns() {
        let conn = Connection::postgres(MemoryStore::new());
        let q = conn.q().select(["name", " ", "email"]);
        assert_eq!(q.columns(), ["name", "email"]);
    }

    #[test]
    fn builds_where_order_limit() {
        let conn = Connection::postgres(MemoryStore::new());
        let q = conn
            .q()
            .where_clause("name = ?", ["mark"])
            .where_clause("age > ?", [30])
            .order("name ASC")
            .limit(5);
        let (sql, args) = q.to_sql_for(&USERS);
        assert_eq!(
            sql,
            "SELECT users.id, users.name FROM users AS users \
             WHERE (name = $1) AND (age > $2) ORDER BY name ASC LIMIT 5"
        );
        assert_eq!(args, vec![Value::from("mark"), Value::Int(30)]);
    }

    #[test]
    fn paginator_overrides_limit() {
        let conn = Connection::postgres(MemoryStore::new());
        let q = conn.q().limit(3).paginate(3, 10);
        let (sql, _) = q.to_sql_for(&USERS);
        assert!(sql.ends_with("LIMIT 10 OFFSET 20"), "{sql}");
    }

    #[test]
    fn raw_query_is_translated_verbatim() {
        let conn = Connection::postgres(MemoryStore::new());
        let q = conn
            .q()
            .where_clause("ignored = ?", [1])
            .raw_query("select * from users where name = ? limit 3", ["mark"]);
        let (sql, args) = q.to_sql_for(&USERS);
        assert_eq!(sql, "select * from users where name = $1 limit 3");
        assert_eq!(args, vec![Value::from("mark")]);
    }

    #[test]
    fn aggregate_copy_drops_paging_state() {
        let conn = Connection::postgres(MemoryStore::new());
        let q = conn
            .q()
            .where_clause("name = ?", ["mark"])
            .order("name")
            .limit(1)
            .paginate(2, 5)
            .eager(Vec::<String>::new());
        let copy = q.aggregate_copy();
        assert!(copy.paginator().is_none());
        assert!(copy.orders().is_empty());
        assert!(!copy.is_eager());
        assert_eq!(
            copy.to_sql_for(&USERS).0,
            "SELECT users.id, users.name FROM users AS users WHERE (name = $1)"
        );
        assert!(q.paginator().is_some());
        assert_eq!(q.orders(), ["name"]);
    }
}
