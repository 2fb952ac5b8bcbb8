use std::fmt::Debug;

use crate::error::{Error, Result};
use crate::types::{DataType, Row};

/// SQL providers implement the [`Connection`] trait to let the ORM execute
/// rendered statements against a backend (`SQLite`, Postgres, etc).
///
/// Calls block until the backend answers. Cancellation and timeouts belong
/// to the implementation.
pub trait Connection: Debug {
    /// Execute a query and return the resulting rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn query(&self, query: String, params: Vec<DataType>) -> Result<Vec<Row>>;

    /// Execute a statement that does not return rows (e.g., an `INSERT`,
    /// `UPDATE`, or `DELETE`) and return the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn exec(&self, query: String, params: Vec<DataType>) -> Result<u64>;

    /// Execute a query and return its first row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRows`] when the query matches nothing, otherwise
    /// any error raised by [`Connection::query`].
    fn query_one(&self, query: String, params: Vec<DataType>) -> Result<Row> {
        self.query(query, params)?.into_iter().next().ok_or(Error::NoRows)
    }
}
