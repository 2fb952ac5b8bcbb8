use sea_query::backend::QueryBuilder as _;
use sea_query::prepare::SqlWriter;
use sea_query::{Expr, SimpleExpr};

use crate::entity::{ID_COLUMN, Metadata};
use crate::error::ConfigError;
use crate::filter::{Filter, split_column};
use crate::mask::FieldMask;
use crate::query::Query;
use crate::statement::{QueryBuilder, table_column};

/// How a node is attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node<'q> {
    pub metadata: &'static Metadata,
    pub mask: &'q FieldMask,
    pub filter: Option<&'q Filter>,
    pub kind: JoinKind,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Node<'_> {
    pub const fn table(&self) -> &'static str {
        self.metadata.table()
    }
}

/// A query and its joins flattened into an arena.
///
/// Nodes are numbered in pre-order, which is also the order entities are
/// materialized in. Node 0 is the root query.
#[derive(Debug)]
pub(crate) struct JoinTree<'q> {
    nodes: Vec<Node<'q>>,
}

impl<'q> JoinTree<'q> {
    /// Flattens and validates `query`.
    pub fn build(query: &'q Query) -> Result<Self, ConfigError> {
        let mut tree = Self { nodes: Vec::new() };
        tree.push(query, None)?;
        tree.validate(query)?;
        Ok(tree)
    }

    fn push(&mut self, query: &'q Query, parent: Option<usize>) -> Result<usize, ConfigError> {
        let metadata = query.metadata()?;
        if parent.is_some() && query.has_pagination() {
            return Err(ConfigError::NestedPagination {
                table: metadata.table(),
            });
        }

        let index = self.nodes.len();
        self.nodes.push(Node {
            metadata,
            mask: &query.mask,
            filter: query.filter.as_ref(),
            kind: if parent.is_some() && query.nullable { JoinKind::Left } else { JoinKind::Inner },
            parent,
            children: Vec::new(),
        });

        for child in &query.joins {
            let child = self.push(child, Some(index))?;
            self.nodes[index].children.push(child);
        }
        Ok(index)
    }

    fn validate(&self, query: &Query) -> Result<(), ConfigError> {
        for (index, node) in self.nodes.iter().enumerate() {
            for name in node.mask.names() {
                node.metadata.check_column(name)?;
            }
            match (node.filter, node.parent) {
                (Some(filter), parent) => {
                    let scope = parent.map_or(self.nodes.as_slice(), |parent| {
                        &self.nodes[parent..=self.subtree_end(index)]
                    });
                    for name in filter.columns() {
                        check_column(scope, node, name)?;
                    }
                }
                (None, Some(_)) => {
                    self.relation(index)?;
                }
                (None, None) => {}
            }
        }

        for (name, _) in &query.order {
            check_column(&self.nodes, self.root(), name)?;
        }
        Ok(())
    }

    /// Index of the last node in the subtree rooted at `index`.
    fn subtree_end(&self, index: usize) -> usize {
        self.nodes[index].children.last().map_or(index, |&child| self.subtree_end(child))
    }

    pub fn root(&self) -> &Node<'q> {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[Node<'q>] {
        &self.nodes
    }

    /// Condition from the declared relation between a node and its parent.
    fn relation(&self, index: usize) -> Result<SimpleExpr, ConfigError> {
        let child = &self.nodes[index];
        let parent = child.parent.map_or_else(|| self.root(), |parent| &self.nodes[parent]);
        let (parent_table, child_table) = (parent.table(), child.table());

        if let Some(column) = child.metadata.relation(parent_table) {
            return Ok(Expr::col(table_column(parent_table, ID_COLUMN))
                .eq(Expr::col(table_column(child_table, column))));
        }
        if let Some(column) = parent.metadata.relation(child_table) {
            return Ok(Expr::col(table_column(parent_table, column))
                .eq(Expr::col(table_column(child_table, ID_COLUMN))));
        }
        Err(ConfigError::MissingRelation {
            parent: parent_table,
            child: child_table,
        })
    }

    fn condition(&self, index: usize) -> Result<SimpleExpr, ConfigError> {
        let node = &self.nodes[index];
        match node.filter {
            Some(filter) => Ok(filter.to_expr(node.table())),
            None => self.relation(index),
        }
    }

    /// Writes the `FROM` clause body: the root table followed by its joins.
    ///
    /// A join with joins of its own is written as a parenthesized group so
    /// its children are joined before its own condition applies.
    pub fn render_from(
        &self, builder: &QueryBuilder, sql: &mut dyn SqlWriter,
    ) -> Result<(), crate::Error> {
        builder.write_iden(self.root().table(), sql);
        for &child in &self.root().children {
            self.render_join(child, builder, sql)?;
        }
        Ok(())
    }

    fn render_join(
        &self, index: usize, builder: &QueryBuilder, sql: &mut dyn SqlWriter,
    ) -> Result<(), crate::Error> {
        let node = &self.nodes[index];
        write!(sql, " {} ", node.kind.keyword())?;

        if node.children.is_empty() {
            builder.write_iden(node.table(), sql);
        } else {
            sql.write_char('(')?;
            builder.write_iden(node.table(), sql);
            for &child in &node.children {
                self.render_join(child, builder, sql)?;
            }
            sql.write_char(')')?;
        }

        sql.write_str(" ON ")?;
        builder.prepare_simple_expr(&self.condition(index)?, sql);
        Ok(())
    }
}

/// Resolves a bare or `table.column` name against the nodes in `scope`.
///
/// A join condition is rendered inside its parent's group, after the
/// parent's earlier joins and its own, so only the parent and those
/// subtrees are in scope for it.
fn check_column(scope: &[Node<'_>], default: &Node<'_>, name: &str) -> Result<(), ConfigError> {
    match split_column(name) {
        (None, column) => default.metadata.check_column(column),
        (Some(table), column) => scope
            .iter()
            .find(|node| node.table() == table)
            .ok_or_else(|| ConfigError::UnknownTable {
                table: table.to_string(),
            })?
            .metadata
            .check_column(column),
    }
}
