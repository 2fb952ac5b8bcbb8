//! Default `SQLite` implementation of [`Connection`].
//!
//! This is a lightweight implementation for development and tests.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fromenv::FromEnv;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection as SqliteConnection, params_from_iter};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::resource::Connection;
use crate::traits::Backend;
use crate::types::{DataType, Field, Row};

/// Options used to connect to the SQL database.
///
/// This struct is used to load connection options from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database path or `SQLite` URI.
    #[env(from = "SQL_DATABASE", default = "file::memory:?cache=shared")]
    pub database: String,

    /// Milliseconds to wait on a locked database before failing.
    #[env(from = "SQL_BUSY_TIMEOUT_MS", default = "5000")]
    pub busy_timeout_ms: String,
}

impl crate::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Ok(Self::from_env().finalize().context("issue loading connection options")?)
    }
}

/// Default implementation of [`Connection`] backed by a single `SQLite`
/// connection.
#[derive(Debug, Clone)]
pub struct SqlDefault {
    // Mutex is necessary since rusqlite::Connection isn't `Sync`
    conn: Arc<parking_lot::Mutex<SqliteConnection>>,
}

impl Backend for SqlDefault {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing SQLite connection to: {}", options.database);

        let busy_timeout: u64 =
            options.busy_timeout_ms.parse().context("invalid SQL_BUSY_TIMEOUT_MS")?;

        let conn = SqliteConnection::open(&options.database)
            .map_err(|e| Error::sqlite(e, "failed to open SQLite database"))?;
        conn.busy_timeout(Duration::from_millis(busy_timeout))
            .map_err(|e| Error::sqlite(e, "failed to set busy timeout"))?;

        Ok(Self {
            conn: Arc::new(parking_lot::Mutex::new(conn)),
        })
    }
}

impl SqlDefault {
    /// Run `f` inside a transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`. `f` must use the connection it is given: calling back
    /// into `self` while the transaction is open blocks forever.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or a database error if the
    /// transaction cannot be opened or committed.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&dyn Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<Error>,
    {
        let mut conn = self.conn.lock();
        let tx =
            conn.transaction().map_err(|e| Error::sqlite(e, "failed to begin transaction"))?;

        tracing::debug!("transaction started");
        let value = f(&SqliteTransaction { conn: &tx })?;

        tx.commit().map_err(|e| Error::sqlite(e, "failed to commit transaction"))?;
        tracing::debug!("transaction committed");

        Ok(value)
    }
}

impl Connection for SqlDefault {
    fn query(&self, query: String, params: Vec<DataType>) -> Result<Vec<Row>> {
        query_rows(&self.conn.lock(), &query, &params)
    }

    fn exec(&self, query: String, params: Vec<DataType>) -> Result<u64> {
        exec_statement(&self.conn.lock(), &query, &params)
    }
}

/// Connection handed to [`SqlDefault::transaction`] callbacks.
#[derive(Debug)]
struct SqliteTransaction<'a> {
    conn: &'a SqliteConnection,
}

impl Connection for SqliteTransaction<'_> {
    fn query(&self, query: String, params: Vec<DataType>) -> Result<Vec<Row>> {
        query_rows(self.conn, &query, &params)
    }

    fn exec(&self, query: String, params: Vec<DataType>) -> Result<u64> {
        exec_statement(self.conn, &query, &params)
    }
}

fn query_rows(conn: &SqliteConnection, query: &str, params: &[DataType]) -> Result<Vec<Row>> {
    tracing::debug!("executing query: {}", query);

    let mut stmt =
        conn.prepare(query).map_err(|e| Error::sqlite(e, "failed to prepare statement"))?;

    let sqlite_params: Vec<_> = params.iter().map(datatype_to_sqlite_value).collect();
    let column_names: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();

    let mut rows = stmt
        .query(params_from_iter(sqlite_params.iter()))
        .map_err(|e| Error::sqlite(e, "failed to execute query"))?;

    let mut result_rows = Vec::new();
    let mut index = 0;
    while let Some(row) = rows.next().map_err(|e| Error::sqlite(e, "failed to fetch row"))? {
        let mut fields = Vec::with_capacity(column_names.len());

        for (i, name) in column_names.iter().enumerate() {
            let value =
                row.get_ref(i).map_err(|e| Error::sqlite(e, "failed to get column value"))?;
            fields.push(Field {
                name: name.clone(),
                value: sqlite_value_to_datatype(value)?,
            });
        }

        result_rows.push(Row {
            index: index.to_string(),
            fields,
        });
        index += 1;
    }

    Ok(result_rows)
}

fn exec_statement(conn: &SqliteConnection, query: &str, params: &[DataType]) -> Result<u64> {
    tracing::debug!("executing statement: {}", query);

    let mut stmt =
        conn.prepare(query).map_err(|e| Error::sqlite(e, "failed to prepare statement"))?;

    let sqlite_params: Vec<_> = params.iter().map(datatype_to_sqlite_value).collect();
    let rows_affected = stmt
        .execute(params_from_iter(sqlite_params.iter()))
        .map_err(|e| Error::sqlite(e, "failed to execute statement"))?;

    Ok(rows_affected as u64)
}

fn datatype_to_sqlite_value(dt: &DataType) -> Value {
    match dt {
        DataType::Boolean(Some(b)) => Value::Integer(i64::from(*b)),
        DataType::Int32(Some(i)) => Value::Integer(i64::from(*i)),
        DataType::Int64(Some(i)) => Value::Integer(*i),
        DataType::Uint32(Some(u)) => Value::Integer(i64::from(*u)),
        DataType::Uint64(Some(u)) => Value::Integer(*u as i64),
        DataType::Float(Some(f)) => Value::Real(f64::from(*f)),
        DataType::Double(Some(f)) => Value::Real(*f),
        DataType::Str(Some(s)) | DataType::Timestamp(Some(s)) => Value::Text(s.clone()),
        DataType::Binary(Some(b)) => Value::Blob(b.clone()),
        // All None variants map to NULL
        _ => Value::Null,
    }
}

fn sqlite_value_to_datatype(value: ValueRef) -> Result<DataType> {
    match value {
        ValueRef::Null => Ok(DataType::Str(None)),
        ValueRef::Integer(i) => Ok(DataType::Int64(Some(i))),
        ValueRef::Real(f) => Ok(DataType::Double(Some(f))),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t).context("invalid UTF-8 in text value")?;
            Ok(DataType::Str(Some(s.to_string())))
        }
        ValueRef::Blob(b) => Ok(DataType::Binary(Some(b.to_vec()))),
    }
}
