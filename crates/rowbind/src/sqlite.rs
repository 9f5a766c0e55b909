//! Adapter for SQLite rows fetched by `sqlx`.
//!
//! SQLite reports values by their storage classes, so dates, times, UUIDs
//! and decimals arrive as text and are parsed by their decoding targets.

use crate::{
    RowSource, Scan, Value,
    error::{Error, Phase},
    source::source_error,
};
use sqlx::{
    Column, Executor, Row, TypeInfo, ValueRef,
    sqlite::{Sqlite, SqliteRow, SqliteValueRef},
};

/// A row source over the rows fetched from SQLite.
pub struct SqliteRows {
    /// Column names.
    columns: Vec<String>,
    /// Rows which have not been reached.
    rows: std::vec::IntoIter<SqliteRow>,
    /// The current row.
    current: Option<SqliteRow>,
}

impl SqliteRows {
    /// Creates a new instance with the fetched rows.
    pub fn new(rows: Vec<SqliteRow>) -> Self {
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| col.name().to_owned())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl RowSource for SqliteRows {
    type Error = sqlx::Error;

    #[inline]
    fn columns(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.columns.clone())
    }

    #[inline]
    fn next_row(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }

    fn write_into(&mut self, targets: &mut [Value]) -> Result<(), Self::Error> {
        let Some(row) = self.current.as_ref() else {
            return Err(sqlx::Error::RowNotFound);
        };
        for (index, target) in targets.iter_mut().enumerate() {
            *target = decode_value(row, index)?;
        }
        Ok(())
    }

    #[inline]
    fn final_error(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    #[inline]
    fn close(&mut self) -> Result<(), Self::Error> {
        self.current = None;
        self.rows = Vec::new().into_iter();
        Ok(())
    }
}

/// Decodes the value at the index by its storage class.
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw_value = row.try_get_raw(index)?;
    if raw_value.is_null() {
        return Ok(Value::Null);
    }

    let declared_bool = row
        .columns()
        .get(index)
        .is_some_and(|col| col.type_info().name() == "BOOLEAN");
    let storage_class = raw_value.type_info().name().to_owned();
    let value = match storage_class.as_str() {
        "INTEGER" if declared_bool => Value::Bool(decode_raw(raw_value)?),
        "INTEGER" => Value::Int(decode_raw(raw_value)?),
        "REAL" => Value::Float(decode_raw(raw_value)?),
        "BLOB" => Value::Bytes(decode_raw::<Vec<u8>>(raw_value)?.into()),
        _ => Value::Text(decode_raw(raw_value)?),
    };
    Ok(value)
}

/// Decodes a raw value as `T`.
#[inline]
fn decode_raw<'r, T: sqlx::Decode<'r, Sqlite>>(raw_value: SqliteValueRef<'r>) -> Result<T, sqlx::Error> {
    T::decode(raw_value).map_err(sqlx::Error::Decode)
}

/// Fetches all the rows of the query.
async fn fetch_rows<'c, E>(executor: E, sql: &str, params: &[Value]) -> Result<SqliteRows, Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param.clone() {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(b),
            Value::Int(i) => query.bind(i),
            Value::UInt(u) => {
                let i = i64::try_from(u).map_err(|err| source_error(Phase::Query, err))?;
                query.bind(i)
            }
            Value::Float(f) => query.bind(f),
            Value::Text(s) => query.bind(s),
            Value::Bytes(bytes) => query.bind(bytes.to_vec()),
            Value::Json(value) => query.bind(value.to_string()),
            Value::Uuid(id) => query.bind(id.to_string()),
            Value::Decimal(d) => query.bind(d.to_string()),
            Value::Date(date) => query.bind(date),
            Value::Time(time) => query.bind(time),
            Value::DateTime(dt) => query.bind(dt),
            Value::Timestamp(dt) => query.bind(dt),
        };
    }

    let rows = query
        .fetch_all(executor)
        .await
        .map_err(|err| source_error(Phase::Query, err))?;
    tracing::debug!(sql, num_rows = rows.len(), "fetch rows from SQLite");
    Ok(SqliteRows::new(rows))
}

/// Runs the query and scans all the rows into the sequence destination.
pub async fn query_all<'c, D, E>(
    dst: &mut D,
    executor: E,
    sql: &str,
    params: &[Value],
) -> Result<(), Error>
where
    D: Scan,
    E: Executor<'c, Database = Sqlite>,
{
    let rows = fetch_rows(executor, sql, params).await?;
    crate::scan_all(dst, rows)
}

/// Runs the query and scans exactly one row into the destination.
pub async fn query_one<'c, D, E>(
    dst: &mut D,
    executor: E,
    sql: &str,
    params: &[Value],
) -> Result<(), Error>
where
    D: Scan,
    E: Executor<'c, Database = Sqlite>,
{
    let rows = fetch_rows(executor, sql, params).await?;
    crate::scan_one(dst, rows)
}

#[cfg(test)]
mod tests {
    use crate::{Value, error::ErrorKind};
    use sqlx::{Connection, SqliteConnection};
    use std::collections::HashMap;

    async fn connect() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE users (id INTEGER, name TEXT, score REAL, active BOOLEAN, avatar BLOB)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO users VALUES (1, 'alice', 9.5, 1, x'0102'), (2, NULL, NULL, 0, NULL)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn it_scans_sqlite_rows() {
        let mut conn = connect().await;
        let mut users = Vec::<HashMap<String, Value>>::new();
        super::query_all(&mut users, &mut conn, "SELECT * FROM users ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["id"], Value::Int(1));
        assert_eq!(users[0]["name"], Value::from("alice"));
        assert_eq!(users[0]["score"], Value::Float(9.5));
        assert_eq!(users[0]["active"], Value::Bool(true));
        assert_eq!(users[0]["avatar"], Value::from(vec![1_u8, 2]));
        assert!(users[1]["name"].is_null());

        let mut name = None::<String>;
        super::query_one(
            &mut name,
            &mut conn,
            "SELECT name FROM users WHERE id = ?",
            &[Value::Int(2)],
        )
        .await
        .unwrap();
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn it_reports_missing_rows() {
        let mut conn = connect().await;
        let mut id = 0_i64;
        let err = super::query_one(
            &mut id,
            &mut conn,
            "SELECT id FROM users WHERE name = ?",
            &[Value::from("nobody")],
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());

        let err = super::query_one(&mut id, &mut conn, "SELECT id FROM users", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TooManyRows { count: 2 });

        let err = super::query_one(&mut id, &mut conn, "SELECT id FROM missing", &[])
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(crate::error::Phase::Query));
    }
}
