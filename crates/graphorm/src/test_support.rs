//! In-memory store for unit tests.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::store::Store;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub args: Vec<Value>,
}

enum Reply {
    Rows(Vec<Row>),
    Fail(String),
}

struct Rule {
    pattern: String,
    args: Option<Vec<Value>>,
    reply: Reply,
}

#[derive(Default)]
struct Inner {
    rules: Mutex<Vec<Rule>>,
    log: Mutex<Vec<Executed>>,
    delay: Option<Duration>,
}

/// Serves canned rows for statements containing a pattern and records every
/// statement it executes. The first matching rule wins; unmatched statements
/// return no rows.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        let rules = std::mem::take(&mut *self.inner.rules.lock().unwrap());
        Self {
            inner: Arc::new(Inner {
                rules: Mutex::new(rules),
                log: Mutex::new(Vec::new()),
                delay: Some(delay),
            }),
        }
    }

    fn rule(self, pattern: &str, args: Option<Vec<Value>>, reply: Reply) -> Self {
        self.inner.rules.lock().unwrap().push(Rule {
            pattern: pattern.to_string(),
            args,
            reply,
        });
        self
    }

    pub fn on(self, pattern: &str, rows: Vec<Row>) -> Self {
        self.rule(pattern, None, Reply::Rows(rows))
    }

    pub fn on_args(self, pattern: &str, args: Vec<Value>, rows: Vec<Row>) -> Self {
        self.rule(pattern, Some(args), Reply::Rows(rows))
    }

    pub fn fail(self, pattern: &str, message: &str) -> Self {
        self.rule(pattern, None, Reply::Fail(message.to_string()))
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.inner.log.lock().unwrap().clone()
    }

    pub fn sqls(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_all(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        if let Some(delay) = self.inner.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.log.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            args: args.to_vec(),
        });

        let rules = self.inner.rules.lock().unwrap();
        let matched = rules.iter().find(|rule| {
            sql.contains(&rule.pattern) && rule.args.as_deref().is_none_or(|a| a == args)
        });
        match matched.map(|rule| &rule.reply) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Fail(message)) => Err(OrmError::Other(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}
