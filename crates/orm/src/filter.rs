use sea_query::{Expr, ExprTrait, SimpleExpr, Value};

use crate::statement::table_column;

/// A predicate over the tables of a query.
///
/// Columns are named either bare (`"name"`), resolving against the table
/// the filter is attached to, or qualified (`"other.name"`) to reach a
/// joined table. Values are plain Rust values converted through
/// [`Value`].
///
/// ```ignore
/// Filter::and([
///     Filter::eq("some.id", 100),
///     Filter::is_not_null("other.name"),
/// ])
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// column = value
    Eq(&'static str, Value),
    /// column != value
    Ne(&'static str, Value),
    /// column > value
    Gt(&'static str, Value),
    /// column >= value
    Gte(&'static str, Value),
    /// column < value
    Lt(&'static str, Value),
    /// column <= value
    Lte(&'static str, Value),
    /// column IN (values)
    In(&'static str, Vec<Value>),
    /// column NOT IN (values)
    NotIn(&'static str, Vec<Value>),
    /// column IS NULL
    IsNull(&'static str),
    /// column IS NOT NULL
    IsNotNull(&'static str),
    /// column LIKE pattern
    Like(&'static str, String),
    /// column BETWEEN low AND high
    Between(&'static str, Value, Value),
    /// Column-to-column equality.
    ColEq(&'static str, &'static str),
    /// All filters hold.
    And(Vec<Self>),
    /// Any filter holds.
    Or(Vec<Self>),
    /// The filter does not hold.
    Not(Box<Self>),
}

/// Splits `table.column` into its parts; bare names carry no table.
pub(crate) fn split_column(name: &str) -> (Option<&str>, &str) {
    name.split_once('.').map_or((None, name), |(table, column)| (Some(table), column))
}

fn column(name: &str, default_table: &str) -> SimpleExpr {
    let (table, column) = split_column(name);
    Expr::col(table_column(table.unwrap_or(default_table), column)).into()
}

impl Filter {
    /// Renders the filter, resolving bare column names against
    /// `default_table`.
    #[must_use]
    pub fn to_expr(&self, default_table: &str) -> SimpleExpr {
        let col = |name: &str| column(name, default_table);
        match self {
            Self::Eq(name, value) => col(*name).eq(value.clone()),
            Self::Ne(name, value) => col(*name).ne(value.clone()),
            Self::Gt(name, value) => col(*name).gt(value.clone()),
            Self::Gte(name, value) => col(*name).gte(value.clone()),
            Self::Lt(name, value) => col(*name).lt(value.clone()),
            Self::Lte(name, value) => col(*name).lte(value.clone()),
            Self::In(name, values) => col(*name).is_in(values.iter().cloned()),
            Self::NotIn(name, values) => col(*name).is_not_in(values.iter().cloned()),
            Self::IsNull(name) => col(*name).is_null(),
            Self::IsNotNull(name) => col(*name).is_not_null(),
            Self::Like(name, pattern) => col(*name).like(pattern.as_str()),
            Self::Between(name, low, high) => col(*name).between(low.clone(), high.clone()),
            Self::ColEq(left, right) => col(*left).eq(col(*right)),
            Self::And(filters) => {
                let mut exprs = filters.iter().map(|f| f.to_expr(default_table));
                exprs.next().map_or_else(
                    || Expr::value(true), // vacuously true
                    |first| exprs.fold(first, SimpleExpr::and),
                )
            }
            Self::Or(filters) => {
                let mut exprs = filters.iter().map(|f| f.to_expr(default_table));
                exprs.next().map_or_else(|| Expr::value(false), |first| exprs.fold(first, SimpleExpr::or))
            }
            Self::Not(filter) => Expr::expr(filter.to_expr(default_table)).not(),
        }
    }

    /// Every column name the filter references, as written.
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns(&self, names: &mut Vec<&'static str>) {
        match self {
            Self::Eq(name, _)
            | Self::Ne(name, _)
            | Self::Gt(name, _)
            | Self::Gte(name, _)
            | Self::Lt(name, _)
            | Self::Lte(name, _)
            | Self::In(name, _)
            | Self::NotIn(name, _)
            | Self::IsNull(name)
            | Self::IsNotNull(name)
            | Self::Like(name, _)
            | Self::Between(name, _, _) => names.push(*name),
            Self::ColEq(left, right) => names.extend([*left, *right]),
            Self::And(filters) | Self::Or(filters) => {
                for filter in filters {
                    filter.collect_columns(names);
                }
            }
            Self::Not(filter) => filter.collect_columns(names),
        }
    }

    /// Creates an equality filter (column = value).
    #[must_use]
    pub fn eq(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Eq(col, val.into())
    }

    /// Creates an inequality filter (column != value).
    #[must_use]
    pub fn ne(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Ne(col, val.into())
    }

    /// Creates a greater-than filter (column > value).
    #[must_use]
    pub fn gt(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Gt(col, val.into())
    }

    /// Creates a greater-than-or-equal filter (column >= value).
    #[must_use]
    pub fn gte(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Gte(col, val.into())
    }

    /// Creates a less-than filter (column < value).
    #[must_use]
    pub fn lt(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Lt(col, val.into())
    }

    /// Creates a less-than-or-equal filter (column <= value).
    #[must_use]
    pub fn lte(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Lte(col, val.into())
    }

    /// Creates an IN filter.
    #[must_use]
    pub fn r#in(col: &'static str, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::In(col, vals.into_iter().map(Into::into).collect())
    }

    /// Creates a NOT IN filter.
    #[must_use]
    pub fn not_in(col: &'static str, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::NotIn(col, vals.into_iter().map(Into::into).collect())
    }

    /// Creates an IS NULL filter.
    #[must_use]
    pub const fn is_null(col: &'static str) -> Self {
        Self::IsNull(col)
    }

    /// Creates an IS NOT NULL filter.
    #[must_use]
    pub const fn is_not_null(col: &'static str) -> Self {
        Self::IsNotNull(col)
    }

    /// Creates a LIKE filter.
    #[must_use]
    pub fn like(col: &'static str, pattern: impl Into<String>) -> Self {
        Self::Like(col, pattern.into())
    }

    /// Creates a BETWEEN filter.
    #[must_use]
    pub fn between(col: &'static str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(col, low.into(), high.into())
    }

    /// Compares two columns for equality.
    #[must_use]
    pub const fn col_eq(left: &'static str, right: &'static str) -> Self {
        Self::ColEq(left, right)
    }

    /// Conjunction of `filters`.
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Disjunction of `filters`.
    #[must_use]
    pub fn or(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Negation of `filter`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Self) -> Self {
        Self::Not(Box::new(filter))
    }
}
