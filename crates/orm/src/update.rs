use sea_query::{Alias, Value};

use crate::entity::{Entity, Metadata};
use crate::error::{ConfigError, Error, Result};
use crate::filter::{Filter, split_column};
use crate::insert::bound_value;
use crate::mask::FieldMask;
use crate::statement::{QueryBuilder, Statement, statement};

/// Builder for an UPDATE of the masked columns of an entity.
pub(crate) struct UpdateBuilder {
    metadata: &'static Metadata,
    set_clauses: Vec<(&'static str, Value)>,
    filter: Filter,
}

impl UpdateBuilder {
    pub fn new(
        metadata: &'static Metadata, mask: &FieldMask, entity: &mut dyn Entity, filter: Filter,
    ) -> Result<Self> {
        for name in mask.names() {
            metadata.check_column(name)?;
        }
        for name in filter.columns() {
            check_filter_column(metadata, name)?;
        }

        let fields = entity.fields();
        let set_clauses = metadata
            .columns()
            .map(|(name, _)| name)
            .filter(|name| mask.participates(name))
            .map(|name| bound_value(metadata, &fields, name).map(|value| (name, value)))
            .collect::<Result<_>>()?;

        Ok(Self {
            metadata,
            set_clauses,
            filter,
        })
    }

    /// Build the UPDATE query, or `None` when no column is set.
    pub fn build(self, builder: QueryBuilder) -> Result<Option<Statement>> {
        if self.set_clauses.is_empty() {
            return Ok(None);
        }

        let table = self.metadata.table();
        let mut update = sea_query::Query::update();
        update.table(Alias::new(table));

        for (column, value) in self.set_clauses {
            update.value(Alias::new(column), value);
        }
        update.and_where(self.filter.to_expr(table));

        let (sql, values) = update.build(builder);
        let statement = statement(sql, values).map_err(Error::Render)?;

        tracing::debug!(
            table,
            sql = %statement.sql,
            param_count = statement.params.len(),
            "UpdateBuilder generated SQL"
        );

        Ok(Some(statement))
    }
}

/// Filter columns of a single-table statement: bare, or qualified with the
/// statement's own table.
pub(crate) fn check_filter_column(metadata: &Metadata, name: &str) -> Result<()> {
    match split_column(name) {
        (Some(table), _) if table != metadata.table() => {
            Err(ConfigError::UnknownTable {
                table: table.to_string(),
            }
            .into())
        }
        (_, column) => Ok(metadata.check_column(column)?),
    }
}
