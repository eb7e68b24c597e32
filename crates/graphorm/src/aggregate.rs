//! Rewriting of generated SELECTs into COUNT / EXISTS aggregates.
//!
//! The inner query may come from `raw_query` and already end in a
//! `LIMIT n` or `LIMIT n OFFSET m` clause. Wrapped as-is, that limit would
//! cap the aggregate, so it is removed first. Only this exact trailing form is
//! recognised (case-insensitive, single spaces, at the very end of the
//! string); `FETCH FIRST n ROWS` and other dialect syntaxes pass through.

use regex::Regex;
use std::sync::OnceLock;

fn limit_offset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)limit [0-9]+ offset [0-9]+$").expect("invalid built-in limit/offset regex")
    })
}

fn limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)limit [0-9]+$").expect("invalid built-in limit regex"))
}

/// Remove a trailing `LIMIT n OFFSET m` or, failing that, `LIMIT n`.
///
/// The result ends exactly where the clause started (any separating space is
/// kept).
pub fn strip_trailing_limit(sql: &str) -> &str {
    for re in [limit_offset_re(), limit_re()] {
        if let Some(m) = re.find(sql) {
            return &sql[..m.start()];
        }
    }
    sql
}

/// `SELECT COUNT(<field>) AS row_count FROM (<sql>) a`
pub fn count_sql(sql: &str, field: &str) -> String {
    format!(
        "SELECT COUNT({}) AS row_count FROM ({}) a",
        field,
        strip_trailing_limit(sql)
    )
}

/// `SELECT EXISTS (<sql>)`
pub fn exists_sql(sql: &str) -> String {
    format!("SELECT EXISTS ({})", strip_trailing_limit(sql))
}
