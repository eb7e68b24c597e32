use graphorm::{Association, Connection, FromRow, Model, ModelMeta, OrmResult, Row, Value};
use tokio_postgres::NoTls;

#[derive(Debug, Default)]
struct Member {
    id: i64,
    name: String,
    notes: Vec<Note>,
}

impl FromRow for Member {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            name: row.try_get_column("name")?,
            ..Self::default()
        })
    }
}

impl Model for Member {
    const META: &'static ModelMeta = &ModelMeta {
        name: "member",
        table: "graphorm_members",
        primary_key: "id",
        columns: &["id", "name", "created_at"],
    };

    fn primary_key(&self) -> Value {
        self.id.into()
    }

    fn associations(&mut self) -> Vec<Association<'_>> {
        vec![Association::has_many("notes", Self::META, self.id, &mut self.notes).order_by("id ASC")]
    }
}

#[derive(Debug, Default)]
struct Note {
    id: i64,
    body: String,
}

impl FromRow for Note {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            body: row.try_get_column("body")?,
        })
    }
}

impl Model for Note {
    const META: &'static ModelMeta = &ModelMeta {
        name: "note",
        table: "graphorm_notes",
        primary_key: "id",
        columns: &[],
    };

    fn primary_key(&self) -> Value {
        self.id.into()
    }
}

#[tokio::test]
async fn finders_roundtrip() -> OrmResult<()> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping finders_roundtrip");
            return Ok(());
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    client
        .batch_execute(
            "CREATE TEMP TABLE graphorm_members (
                 id BIGINT PRIMARY KEY,
                 name TEXT NOT NULL,
                 created_at TIMESTAMPTZ NOT NULL DEFAULT now()
             );
             CREATE TEMP TABLE graphorm_notes (
                 id BIGINT PRIMARY KEY,
                 member_id BIGINT NOT NULL,
                 body TEXT NOT NULL
             );
             INSERT INTO graphorm_members (id, name, created_at) VALUES
                 (1, 'alice', now() - interval '2 days'),
                 (2, 'bob', now() - interval '1 day'),
                 (3, 'carol', now());
             INSERT INTO graphorm_notes (id, member_id, body) VALUES
                 (10, 1, 'first'), (11, 1, 'second'), (12, 3, 'third');",
        )
        .await?;

    let conn = Connection::postgres(client);

    let alice: Member = conn.find("1").await?;
    assert_eq!(alice.name, "alice");

    let newest: Member = conn.last().await?;
    assert_eq!(newest.name, "carol");

    assert!(conn.q().where_clause("name = ?", ["bob"]).exists::<Member>().await?);
    assert!(!conn.q().where_clause("name = ?", ["dave"]).exists::<Member>().await?);

    let mut q = conn.q().order("id ASC").paginate(2, 2).eager(["notes"]);
    let page: Vec<Member> = q.all().await?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].notes.len(), 1);
    let paginator = q.paginator().copied().unwrap_or_default();
    assert_eq!(paginator.total_entries_size, 3);
    assert_eq!(paginator.total_pages, 2);

    let mut alice = alice;
    conn.load(&mut alice, &[]).await?;
    let bodies: Vec<_> = alice.notes.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second"]);

    let err = conn.find::<Member>(99).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}
