//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by query execution.
#[derive(Error, Debug)]
pub enum Error {
    /// The query is misconfigured. These are programmer errors and are never
    /// worth retrying.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A value returned by the store could not be scanned into its binding.
    #[error("cannot decode {table}.{column}: {source}")]
    Decode {
        /// Table of the offending column.
        table: &'static str,
        /// Offending column.
        column: &'static str,
        /// Underlying conversion failure.
        source: anyhow::Error,
    },

    /// A statement could not be rendered or its parameters encoded.
    #[error("cannot render statement: {0}")]
    Render(anyhow::Error),

    /// Error raised by the connection, passed through unchanged.
    #[error(transparent)]
    Sql(#[from] tabula_sql::Error),
}

impl Error {
    /// Returns `true` when a fetch matched no rows.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Sql(tabula_sql::Error::NoRows))
    }

    /// Returns `true` when the store rejected a write with a constraint
    /// violation.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Sql(tabula_sql::Error::Constraint(_)))
    }

    /// Returns `true` for configuration errors.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::Render(err.into())
    }
}

/// A query that cannot be executed as configured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No entity was supplied with `from`.
    #[error("query has no entity, call `from` first")]
    MissingEntity,

    /// The entity metadata has an empty table name.
    #[error("entity metadata has an empty table name")]
    EmptyTable,

    /// A mask, filter or ordering names a column the table does not have.
    #[error("unknown column {table}.{column}")]
    UnknownColumn {
        /// Table the column was resolved against.
        table: &'static str,
        /// Column name.
        column: String,
    },

    /// A filter or ordering names a table that is not part of the query.
    #[error("table {table} is not part of the query")]
    UnknownTable {
        /// Table name.
        table: String,
    },

    /// The operation requires a `where` filter.
    #[error("{operation} requires a filter")]
    MissingFilter {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// An insert excludes a column that is neither nullable nor defaulted.
    #[error("column {table}.{column} is required: it is not nullable and has no default")]
    MissingValue {
        /// Table of the column.
        table: &'static str,
        /// Column name.
        column: &'static str,
    },

    /// The entity does not bind a column its metadata declares.
    #[error("entity for {table} does not bind column {column}")]
    MissingBinding {
        /// Table of the column.
        table: &'static str,
        /// Column name.
        column: &'static str,
    },

    /// A join has no filter and no relation links the two tables.
    #[error("no relation between {parent} and {child}, supply a join filter")]
    MissingRelation {
        /// Table joined to.
        parent: &'static str,
        /// Joined table.
        child: &'static str,
    },

    /// Ordering or pagination was set on a nested join.
    #[error("ordering and pagination are not supported on joined table {table}")]
    NestedPagination {
        /// Joined table carrying the settings.
        table: &'static str,
    },

    /// A write operation was configured with joins.
    #[error("{operation} does not support joins")]
    UnsupportedJoin {
        /// Operation that was attempted.
        operation: &'static str,
    },
}
