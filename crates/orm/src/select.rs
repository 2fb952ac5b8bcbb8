use std::fmt::Write as _;

use anyhow::anyhow;
use sea_query::Value;
use sea_query::backend::QueryBuilder as _;
use sea_query::prepare::SqlWriter;
use tabula_sql::Row;

use crate::binding::Binding;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::filter::split_column;
use crate::join::JoinTree;
use crate::query::{Order, Query};
use crate::statement::{QueryBuilder, Statement, statement};

/// Columns read for one node of the join tree, in projection order.
type Projection = Vec<(usize, Vec<&'static str>)>;

/// Builds the joined `SELECT` for a query and maps its rows back to
/// entities.
pub(crate) struct SelectBuilder<'t, 'q> {
    tree: &'t JoinTree<'q>,
    query: &'q Query,
    projection: Projection,
}

impl<'t, 'q> SelectBuilder<'t, 'q> {
    pub fn new(tree: &'t JoinTree<'q>, query: &'q Query) -> Self {
        let projection = tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let columns = node
                    .metadata
                    .columns()
                    .map(|(name, _)| name)
                    .filter(|name| node.mask.participates(name))
                    .collect();
                (index, columns)
            })
            .collect();

        Self {
            tree,
            query,
            projection,
        }
    }

    /// Build the SELECT statement.
    pub fn build(&self) -> Result<Statement> {
        let builder = &self.query.builder;
        let root = self.tree.root();
        let mut sql = builder.writer();

        sql.write_str("SELECT ")?;
        let mut columns = self.projection.iter().flat_map(|(index, columns)| {
            let table = self.tree.nodes()[*index].table();
            columns.iter().map(move |column| (table, *column))
        });
        match columns.next() {
            Some((table, column)) => {
                write_column(builder, table, column, &mut sql)?;
                for (table, column) in columns {
                    sql.write_str(", ")?;
                    write_column(builder, table, column, &mut sql)?;
                }
            }
            // nothing selected, rows still need a column
            None => sql.write_char('1')?,
        }

        sql.write_str(" FROM ")?;
        self.tree.render_from(builder, &mut sql)?;
        write_where(&self.query.builder, self.tree, &mut sql)?;

        for (position, (name, order)) in self.query.order.iter().enumerate() {
            sql.write_str(if position == 0 { " ORDER BY " } else { ", " })?;
            let (table, column) = split_column(name);
            write_column(builder, table.unwrap_or_else(|| root.table()), column, &mut sql)?;
            sql.write_str(match order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            })?;
        }

        // OFFSET is only valid after a LIMIT
        if self.query.limit.is_some() || self.query.offset.is_some() {
            let limit = self.query.limit.unwrap_or(i64::MAX.unsigned_abs());
            sql.write_str(" LIMIT ")?;
            builder.prepare_value(&Value::BigUnsigned(Some(limit)), &mut sql);
        }
        if let Some(offset) = self.query.offset {
            sql.write_str(" OFFSET ")?;
            builder.prepare_value(&Value::BigUnsigned(Some(offset)), &mut sql);
        }

        let (sql, values) = sql.into_parts();
        let statement = statement(sql, values).map_err(Error::Render)?;

        tracing::debug!(
            table = root.table(),
            sql = %statement.sql,
            param_count = statement.params.len(),
            "SelectBuilder generated SQL"
        );

        Ok(statement)
    }

    /// Scans a result row into fresh entities, one per join tree node.
    pub fn materialize(&self, row: &Row) -> Result<Vec<Box<dyn Entity>>> {
        let mut values = row.fields.iter();
        let mut entities = Vec::with_capacity(self.projection.len());

        for (index, columns) in &self.projection {
            let metadata = self.tree.nodes()[*index].metadata;
            let table = metadata.table();
            let mut entity = metadata.create();

            let mut fields = entity.fields();
            for &column in columns {
                let decode = |source| Error::Decode {
                    table,
                    column,
                    source,
                };
                let field = values.next().ok_or_else(|| decode(anyhow!("row has too few columns")))?;
                let binding = fields
                    .get_mut(column)
                    .ok_or_else(|| decode(anyhow!("entity does not bind the column")))?;
                binding.scan(&field.value).map_err(decode)?;
            }
            drop(fields);

            entities.push(entity);
        }

        Ok(entities)
    }
}

/// Builds `SELECT COUNT(*)` over the same tables and filter as
/// [`SelectBuilder`].
pub(crate) struct CountBuilder<'t, 'q> {
    tree: &'t JoinTree<'q>,
    query: &'q Query,
}

impl<'t, 'q> CountBuilder<'t, 'q> {
    pub const fn new(tree: &'t JoinTree<'q>, query: &'q Query) -> Self {
        Self { tree, query }
    }

    /// Build the COUNT statement.
    pub fn build(&self) -> Result<Statement> {
        let builder = &self.query.builder;
        let mut sql = builder.writer();

        sql.write_str("SELECT COUNT(*) FROM ")?;
        self.tree.render_from(builder, &mut sql)?;
        write_where(builder, self.tree, &mut sql)?;

        let (sql, values) = sql.into_parts();
        let statement = statement(sql, values).map_err(Error::Render)?;

        tracing::debug!(
            table = self.tree.root().table(),
            sql = %statement.sql,
            param_count = statement.params.len(),
            "CountBuilder generated SQL"
        );

        Ok(statement)
    }

    pub fn decode(&self, row: &Row) -> Result<i64> {
        let decode = |source| Error::Decode {
            table: self.tree.root().table(),
            column: "COUNT(*)",
            source,
        };

        let field = row.fields.first().ok_or_else(|| decode(anyhow!("count returned no columns")))?;
        let mut count = None;
        Binding::Int(&mut count).scan(&field.value).map_err(decode)?;
        count.ok_or_else(|| decode(anyhow!("count is null")))
    }
}

fn write_where(builder: &QueryBuilder, tree: &JoinTree<'_>, sql: &mut dyn SqlWriter) -> Result<()> {
    let root = tree.root();
    if let Some(filter) = root.filter {
        sql.write_str(" WHERE ")?;
        builder.prepare_simple_expr(&filter.to_expr(root.table()), sql);
    }
    Ok(())
}

fn write_column(
    builder: &QueryBuilder, table: &str, column: &str, sql: &mut dyn SqlWriter,
) -> Result<()> {
    builder.write_iden(table, sql);
    sql.write_char('.')?;
    builder.write_iden(column, sql);
    Ok(())
}
