//! SQL dialects.
//!
//! A [`Dialect`] turns the clauses accumulated on a [`Query`](crate::Query)
//! into SQL text. Conditions are written with `?` placeholders and translated
//! to the dialect's positional form when the statement is rendered.

use crate::model::ModelMeta;
use std::fmt;

/// The clause state of a SELECT, ready to be rendered.
#[derive(Debug, Clone, Copy)]
pub struct SelectParts<'a> {
    /// Explicit column list; empty means every column of the model.
    pub columns: &'a [String],
    /// WHERE conditions, joined with `AND`.
    pub conditions: &'a [String],
    /// ORDER BY fragments, in call order.
    pub orders: &'a [String],
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Database-specific SQL generation.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Positional placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Replace `?` markers with positional placeholders.
    ///
    /// Question marks inside single-quoted string literals are left alone.
    fn translate(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut index = 0;
        let mut in_string = false;
        for ch in sql.chars() {
            match ch {
                '\'' => {
                    in_string = !in_string;
                    out.push(ch);
                }
                '?' if !in_string => {
                    index += 1;
                    out.push_str(&self.placeholder(index));
                }
                _ => out.push(ch),
            }
        }
        out
    }

    /// Render a SELECT for `meta` with `?` placeholders already translated.
    fn select_sql(&self, meta: &ModelMeta, parts: SelectParts<'_>) -> String {
        let table = meta.table;
        let columns = if !parts.columns.is_empty() {
            parts.columns.join(", ")
        } else if meta.columns.is_empty() {
            format!("{table}.*")
        } else {
            meta.columns
                .iter()
                .map(|c| format!("{table}.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {table} AS {table}");
        if !parts.conditions.is_empty() {
            sql.push_str(" WHERE ");
            let conditions: Vec<String> =
                parts.conditions.iter().map(|c| format!("({c})")).collect();
            sql.push_str(&conditions.join(" AND "));
        }
        if !parts.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.orders.join(", "));
        }
        if let Some(limit) = parts.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = parts.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        self.translate(&sql)
    }
}

/// PostgreSQL: `$1, $2, ...` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }
}
