use sea_query::Alias;

use crate::entity::Metadata;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::statement::{QueryBuilder, Statement, statement};
use crate::update::check_filter_column;

/// Builder for constructing DELETE queries.
pub(crate) struct DeleteBuilder {
    metadata: &'static Metadata,
    filter: Filter,
}

impl DeleteBuilder {
    pub fn new(metadata: &'static Metadata, filter: Filter) -> Result<Self> {
        for name in filter.columns() {
            check_filter_column(metadata, name)?;
        }
        Ok(Self { metadata, filter })
    }

    /// Build the DELETE query.
    pub fn build(self, builder: QueryBuilder) -> Result<Statement> {
        let table = self.metadata.table();
        let mut delete = sea_query::Query::delete();
        delete.from_table(Alias::new(table));
        delete.and_where(self.filter.to_expr(table));

        let (sql, values) = delete.build(builder);
        let statement = statement(sql, values).map_err(Error::Render)?;

        tracing::debug!(
            table,
            sql = %statement.sql,
            param_count = statement.params.len(),
            "DeleteBuilder generated SQL"
        );

        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use tabula_sql::DataType;

    use super::*;
    use crate::binding::{Binding, Fields};
    use crate::entity::{Column, ColumnType, Entity, ID_COLUMN};

    #[derive(Debug, Default)]
    struct Session {
        id: Option<i64>,
    }

    static SESSIONS: LazyLock<Metadata> = LazyLock::new(|| {
        Metadata::new("sessions", || Box::<Session>::default())
            .with_column(ID_COLUMN, Column::new(ColumnType::Int))
    });

    impl Entity for Session {
        fn metadata(&self) -> &'static Metadata {
            &SESSIONS
        }

        fn fields(&mut self) -> Fields<'_> {
            Fields::from([(ID_COLUMN, Binding::Int(&mut self.id))])
        }
    }

    #[test]
    fn delete_with_filter() {
        let statement = DeleteBuilder::new(&SESSIONS, Filter::r#in("id", [1_i64, 2]))
            .unwrap()
            .build(QueryBuilder::default())
            .unwrap();

        assert!(statement.sql.starts_with(r#"DELETE FROM "sessions" WHERE "#));
        assert!(statement.sql.contains(r#""sessions"."id""#));
        assert_eq!(statement.params, vec![DataType::Int64(Some(1)), DataType::Int64(Some(2))]);
    }

    #[test]
    fn anonymous_placeholders() {
        let statement = DeleteBuilder::new(&SESSIONS, Filter::eq("sessions.id", 1_i64))
            .unwrap()
            .build(QueryBuilder::default().anonymous())
            .unwrap();
        assert!(statement.sql.contains('?'));
        assert!(!statement.sql.contains('$'));
    }
}
