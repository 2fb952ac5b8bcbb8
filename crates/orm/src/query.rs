use tabula_sql::Connection;

use crate::delete::DeleteBuilder;
use crate::entity::{Entity, Metadata};
use crate::error::{ConfigError, Error, Result};
use crate::filter::Filter;
use crate::insert::InsertBuilder;
use crate::join::JoinTree;
use crate::mask::FieldMask;
use crate::select::{CountBuilder, SelectBuilder};
use crate::statement::{QueryBuilder, Statement};
use crate::update::UpdateBuilder;

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// A declarative description of one statement over an entity and,
/// optionally, a tree of joined entities.
///
/// Configure once, then execute once: every executor consumes the query.
/// Configuration never fails; the query is validated when it runs.
///
/// ```ignore
/// let row = Query::new()
///     .from(Some::default())
///     .r#where(Filter::eq("some.id", 100))
///     .join(Query::new().from(Other::default()).nullable())
///     .fetch(&conn)?;
/// ```
#[derive(Debug, Default)]
pub struct Query {
    pub(crate) entity: Option<Box<dyn Entity>>,
    pub(crate) mask: FieldMask,
    pub(crate) filter: Option<Filter>,
    pub(crate) joins: Vec<Self>,
    pub(crate) order: Vec<(&'static str, Order)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) nullable: bool,
    pub(crate) builder: QueryBuilder,
}

impl Query {
    /// An empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statement backend.
    #[must_use]
    pub const fn with_builder(mut self, builder: QueryBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Sets the entity: its table, and the values written by
    /// [`insert`](Self::insert) and [`update`](Self::update).
    #[must_use]
    pub fn from(mut self, entity: impl Entity) -> Self {
        self.entity = Some(Box::new(entity));
        self
    }

    /// Sets the columns read or written.
    #[must_use]
    pub fn select(mut self, mask: FieldMask) -> Self {
        self.mask = mask;
        self
    }

    /// Sets the filter. On a joined query the filter replaces the default
    /// join condition.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Joins `child` to this query.
    #[must_use]
    pub fn join(mut self, child: Self) -> Self {
        self.joins.push(child);
        self
    }

    /// Marks this query as an optional (`LEFT`) join. Has no effect on a
    /// top-level query.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Adds an ordering key. `column` may be qualified as `table.column` to
    /// order by a joined table.
    #[must_use]
    pub fn order_by(mut self, column: &'static str, order: Order) -> Self {
        self.order.push((column, order));
        self
    }

    /// Limits the number of rows listed.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips rows before listing.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Fetches a single row: the root entity followed by every joined
    /// entity in join order.
    ///
    /// When the filter matches more than one row, the first is returned.
    ///
    /// # Errors
    ///
    /// Returns [`tabula_sql::Error::NoRows`] (see [`Error::is_not_found`])
    /// when nothing matches, a [`ConfigError`] for an invalid query, or the
    /// connection's error.
    pub fn fetch(self, conn: &dyn Connection) -> Result<Vec<Box<dyn Entity>>> {
        let tree = JoinTree::build(&self)?;
        let select = SelectBuilder::new(&tree, &self);
        let statement = select.build()?;
        let row = conn.query_one(statement.sql, statement.params)?;
        select.materialize(&row)
    }

    /// Lists every matching row, applying ordering and pagination.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid query, or the connection's
    /// error.
    pub fn list(self, conn: &dyn Connection) -> Result<Vec<Vec<Box<dyn Entity>>>> {
        let tree = JoinTree::build(&self)?;
        let select = SelectBuilder::new(&tree, &self);
        let statement = select.build()?;
        let rows = conn.query(statement.sql, statement.params)?;
        rows.iter().map(|row| select.materialize(row)).collect()
    }

    /// Counts matching rows. The mask and pagination are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid query, or the connection's
    /// error.
    pub fn count(self, conn: &dyn Connection) -> Result<i64> {
        let tree = JoinTree::build(&self)?;
        let count = CountBuilder::new(&tree, &self);
        let statement = count.build()?;
        let row = conn.query_one(statement.sql, statement.params)?;
        count.decode(&row)
    }

    /// Inserts the entity and returns its identifier.
    ///
    /// Columns outside the mask are left to the store, so each must be
    /// nullable or defaulted. The `id` column may always be left out, in
    /// which case the store assigns it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid query, a constraint
    /// violation (see [`Error::is_constraint`]), or the connection's error.
    pub fn insert(mut self, conn: &dyn Connection) -> Result<i64> {
        self.check_write("insert")?;
        let metadata = self.metadata()?;
        let builder = self.builder;
        let entity = self.entity.as_deref_mut().ok_or(ConfigError::MissingEntity)?;
        let insert = InsertBuilder::new(metadata, &self.mask, entity)?;
        let statement = insert.build(builder)?;
        let row = conn.query_one(statement.sql, statement.params)?;
        InsertBuilder::decode(metadata, &row)
    }

    /// Writes the masked columns of the entity to every row the filter
    /// matches. An empty column set does nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the query has no filter or is otherwise
    /// invalid, a constraint violation, or the connection's error.
    pub fn update(mut self, conn: &dyn Connection) -> Result<()> {
        self.check_write("update")?;
        let metadata = self.metadata()?;
        let builder = self.builder;
        let filter = self.filter.take().ok_or(ConfigError::MissingFilter { operation: "update" })?;
        let entity = self.entity.as_deref_mut().ok_or(ConfigError::MissingEntity)?;
        let update = UpdateBuilder::new(metadata, &self.mask, entity, filter)?;
        let Some(statement) = update.build(builder)? else {
            tracing::debug!(table = metadata.table(), "update has no columns, skipping");
            return Ok(());
        };
        conn.exec(statement.sql, statement.params)?;
        Ok(())
    }

    /// Deletes every row the filter matches and returns how many were
    /// removed. Matching nothing is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the query has no entity or filter, or
    /// the connection's error.
    pub fn delete(self, conn: &dyn Connection) -> Result<u64> {
        self.check_write("delete")?;
        let metadata = self.metadata()?;
        let filter = self.filter.ok_or(ConfigError::MissingFilter { operation: "delete" })?;
        let statement = DeleteBuilder::new(metadata, filter)?.build(self.builder)?;
        Ok(conn.exec(statement.sql, statement.params)?)
    }

    /// Renders the `SELECT` that [`fetch`](Self::fetch) and
    /// [`list`](Self::list) run, without executing it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid query.
    pub fn select_statement(&self) -> Result<Statement> {
        let tree = JoinTree::build(self)?;
        SelectBuilder::new(&tree, self).build()
    }

    /// Renders the `SELECT COUNT(*)` that [`count`](Self::count) runs,
    /// without executing it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid query.
    pub fn count_statement(&self) -> Result<Statement> {
        let tree = JoinTree::build(self)?;
        CountBuilder::new(&tree, self).build()
    }

    pub(crate) fn metadata(&self) -> Result<&'static Metadata, ConfigError> {
        let metadata = self.entity.as_ref().ok_or(ConfigError::MissingEntity)?.metadata();
        metadata.validate()?;
        Ok(metadata)
    }

    pub(crate) fn has_pagination(&self) -> bool {
        !self.order.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    fn check_write(&self, operation: &'static str) -> Result<(), Error> {
        if self.joins.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedJoin { operation }.into())
        }
    }
}
