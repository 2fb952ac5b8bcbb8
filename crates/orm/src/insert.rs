use anyhow::anyhow;
use sea_query::{Alias, SimpleExpr, Value};
use tabula_sql::Row;

use crate::binding::{Binding, Fields};
use crate::entity::{Entity, ID_COLUMN, Metadata};
use crate::error::{ConfigError, Error, Result};
use crate::mask::FieldMask;
use crate::statement::{QueryBuilder, Statement, statement};

/// Builder for the INSERT of a single entity.
pub(crate) struct InsertBuilder {
    metadata: &'static Metadata,
    values: Vec<(&'static str, Value)>,
}

impl InsertBuilder {
    /// Collects the masked column values of `entity`.
    ///
    /// Every column left out must be one the store can fill in: nullable,
    /// defaulted, or the primary key.
    pub fn new(metadata: &'static Metadata, mask: &FieldMask, entity: &mut dyn Entity) -> Result<Self> {
        for name in mask.names() {
            metadata.check_column(name)?;
        }

        let fields = entity.fields();
        let mut values = Vec::new();
        for (name, column) in metadata.columns() {
            if mask.participates(name) {
                values.push((name, bound_value(metadata, &fields, name)?));
            } else if !(column.has_default() || column.nullable || name == ID_COLUMN) {
                return Err(ConfigError::MissingValue {
                    table: metadata.table(),
                    column: name,
                }
                .into());
            }
        }

        Ok(Self { metadata, values })
    }

    /// Build the INSERT query.
    pub fn build(self, builder: QueryBuilder) -> Result<Statement> {
        let table = self.metadata.table();
        let mut insert = sea_query::Query::insert();
        insert.into_table(Alias::new(table));

        if self.values.is_empty() {
            insert.or_default_values();
        } else {
            let columns: Vec<_> = self.values.iter().map(|(column, _)| Alias::new(*column)).collect();
            let row: Vec<SimpleExpr> =
                self.values.into_iter().map(|(_, value)| SimpleExpr::Value(value)).collect();
            insert.columns(columns);
            insert.values(row).map_err(|err| Error::Render(err.into()))?;
        }
        insert.returning_col(Alias::new(ID_COLUMN));

        let (sql, values) = insert.build(builder);
        let statement = statement(sql, values).map_err(Error::Render)?;

        tracing::debug!(
            table,
            sql = %statement.sql,
            param_count = statement.params.len(),
            "InsertBuilder generated SQL"
        );

        Ok(statement)
    }

    /// Reads the identifier returned by the insert.
    pub fn decode(metadata: &'static Metadata, row: &Row) -> Result<i64> {
        let decode = |source| Error::Decode {
            table: metadata.table(),
            column: ID_COLUMN,
            source,
        };

        let field = row.fields.first().ok_or_else(|| decode(anyhow!("insert returned no id")))?;
        let mut id = None;
        Binding::Int(&mut id).scan(&field.value).map_err(decode)?;
        id.ok_or_else(|| decode(anyhow!("insert returned a null id")))
    }
}

/// Current value of a bound column, or an error when the entity does not
/// bind a declared column.
pub(crate) fn bound_value(
    metadata: &'static Metadata, fields: &Fields<'_>, name: &'static str,
) -> Result<Value> {
    fields.get(name).map(Binding::value).ok_or_else(|| {
        ConfigError::MissingBinding {
            table: metadata.table(),
            column: name,
        }
        .into()
    })
}
