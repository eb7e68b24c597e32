//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::Type;
use uuid::Uuid;

/// An owned result row: column names paired with decoded values.
///
/// Stores hand rows back in this form so finders, hooks and tests do not
/// depend on a particular driver's row type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder style).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value of the first column (aggregate results).
    pub fn first_value(&self) -> Option<&Value> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Decode a column by name.
    pub fn try_get_column<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;
        T::from_value(value).map_err(|message| OrmError::decode(column, message))
    }

    /// Decode a driver row column by column.
    pub fn from_pg(row: &tokio_postgres::Row) -> OrmResult<Self> {
        let mut out = Row::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value = decode_pg_column(row, idx, column.type_())
                .map_err(|message| OrmError::decode(column.name(), message))?;
            out.push(column.name(), value);
        }
        Ok(out)
    }
}

fn decode_pg_column(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Value, String> {
    fn get<'a, T>(row: &'a tokio_postgres::Row, idx: usize) -> Result<Option<T>, String>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get::<_, Option<T>>(idx).map_err(|e| e.to_string())
    }

    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(Value::from),
        Type::INT4 => get::<i32>(row, idx)?.map(Value::from),
        Type::INT8 => get::<i64>(row, idx)?.map(Value::Int),
        Type::OID => get::<u32>(row, idx)?.map(Value::from),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(Value::from),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(Value::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, idx)?.map(Value::Text)
        }
        Type::BYTEA => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        Type::UUID => get::<Uuid>(row, idx)?.map(Value::Uuid),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(Value::Timestamptz),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.map(Value::Timestamp),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx)?.map(Value::Json),
        ref other => return Err(format!("unsupported column type {other}")),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Trait for converting a [`Row`] into a Rust struct.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Single-column aggregate result, as produced by
/// `SELECT COUNT(..) AS row_count ...`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCount {
    pub count: i64,
}

impl FromRow for RowCount {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            count: row.try_get_column("row_count")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_get_column_decodes_by_name() {
        let row = Row::new().with("id", 7_i64).with("name", "mark");
        assert_eq!(row.try_get_column::<i64>("id").unwrap(), 7);
        assert_eq!(row.try_get_column::<String>("name").unwrap(), "mark");
        assert_eq!(row.first_value(), Some(&Value::Int(7)));
    }

    #[test]
    fn missing_column_is_decode_error() {
        let row = Row::new().with("id", 1_i64);
        let err = row.try_get_column::<String>("email").unwrap_err();
        assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "email"));
    }

    #[test]
    fn row_count_reads_alias() {
        let row = Row::new().with("row_count", 23_i64);
        assert_eq!(RowCount::from_row(&row).unwrap().count, 23);
    }
}
