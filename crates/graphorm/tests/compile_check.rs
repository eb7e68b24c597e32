//! Compile-only tests for the public API.
//!
//! These tests do NOT execute against a database; they only check types and
//! signatures.

#![allow(dead_code)]

use graphorm::{
    Association, Connection, ConnectionConfig, FromRow, Model, ModelMeta, OrmResult, Paginator,
    Row, Value,
};
use std::time::Duration;

#[derive(Debug, Default)]
struct Author {
    id: i64,
    name: String,
    posts: Vec<Post>,
}

impl FromRow for Author {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            name: row.try_get_column("name")?,
            ..Self::default()
        })
    }
}

impl Model for Author {
    const META: &'static ModelMeta = &ModelMeta {
        name: "author",
        table: "compile_authors",
        primary_key: "id",
        columns: &["id", "name"],
    };

    fn primary_key(&self) -> Value {
        self.id.into()
    }

    fn associations(&mut self) -> Vec<Association<'_>> {
        vec![
            Association::has_many("posts", Self::META, self.id, &mut self.posts)
                .order_by("created_at DESC"),
        ]
    }
}

#[derive(Debug, Default)]
struct Post {
    id: i64,
    author_id: i64,
    author: Option<Author>,
}

impl FromRow for Post {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            author_id: row.try_get_column("author_id")?,
            author: None,
        })
    }
}

impl Model for Post {
    const META: &'static ModelMeta = &ModelMeta {
        name: "post",
        table: "compile_posts",
        primary_key: "id",
        columns: &[],
    };

    fn primary_key(&self) -> Value {
        self.id.into()
    }

    fn associations(&mut self) -> Vec<Association<'_>> {
        vec![Association::belongs_to("author", self.author_id, &mut self.author)]
    }
}

fn assert_send<T: Send>(_: &T) {}

#[test]
fn compile_finders_on_client() {
    let _ = |client: tokio_postgres::Client| async move {
        let conn = Connection::postgres(client).with_config(
            ConnectionConfig::new()
                .with_query_timeout(Duration::from_secs(5))
                .with_slow_query_threshold(Duration::from_millis(200)),
        );

        let _: Author = conn.find(1).await?;
        let _: Author = conn.find("1").await?;
        let _: Author = conn.first().await?;
        let _: Author = conn.last().await?;
        let _: Vec<Author> = conn.all().await?;
        let _: bool = conn.exists::<Author>().await?;
        let _: u64 = conn.count::<Author>().await?;
        let _: u64 = conn.count_by_field::<Author>("name").await?;

        let mut q = conn
            .q()
            .select(["id", "name"])
            .where_clause("name = ?", ["alice"])
            .order("name ASC")
            .paginate(1, 20)
            .eager(["posts.author"]);
        let _: Vec<Author> = q.all().await?;
        let _: Option<&Paginator> = q.paginator();

        let mut author: Author = conn.first().await?;
        conn.load(&mut author, &[]).await?;
        let mut posts: Vec<Post> = conn.all().await?;
        conn.load_many(&mut posts, &["author".to_string()]).await?;
        OrmResult::Ok(())
    };
}

#[test]
fn compile_finder_futures_are_send() {
    let _ = |conn: Connection| async move {
        let mut q = conn.eager(["posts"]);
        let fut = q.first::<Author>();
        assert_send(&fut);
        let _ = fut.await;
    };
}

#[cfg(feature = "pool")]
#[test]
fn compile_pool_connection() {
    let _ = || -> OrmResult<()> {
        let pool = graphorm::create_pool_with_config("postgres://localhost/db", 4)?;
        let _ = Connection::postgres(pool);
        let _ = Connection::connect("postgres://localhost/db")?;
        Ok(())
    };
}
