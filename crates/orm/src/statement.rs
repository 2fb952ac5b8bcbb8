use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::{SqlWriter, SqlWriterValues};
use sea_query::{
    Alias, BinOper, ColumnRef, Iden, IntoIden, Oper, Quote, SimpleExpr, SubQueryStatement, Value,
    Values,
};
use tabula_sql::DataType;

/// A rendered statement ready for a [`Connection`](tabula_sql::Connection).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with numbered placeholders.
    pub sql: String,

    /// Parameters, in placeholder order.
    pub params: Vec<DataType>,
}

/// sea-query backend used to render statements: identifier quoting and
/// placeholder syntax.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    /// Identifier quote.
    pub quote: Quote,
    /// Placeholder prefix.
    pub placeholder: &'static str, // "?" or "$"
    /// Whether placeholders carry their position.
    pub numbered: bool, // false for "?", true for "$1, $2, ..."
}

impl Default for QueryBuilder {
    // should work for `Postgres` and `Sqlite`
    fn default() -> Self {
        Self {
            quote: Quote::new(b'"'),
            placeholder: "$",
            numbered: true,
        }
    }
}

impl QueryBuilder {
    /// Anonymous `?` placeholders.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.placeholder = "?";
        self.numbered = false;
        self
    }

    /// A writer that collects parameters with this builder's placeholder
    /// style.
    pub(crate) fn writer(&self) -> SqlWriterValues {
        SqlWriterValues::new(self.placeholder, self.numbered)
    }

    /// Writes a quoted identifier.
    pub(crate) fn write_iden(&self, name: &str, sql: &mut dyn SqlWriter) {
        Alias::new(name).prepare(sql.as_writer(), self.quote());
    }
}

impl QuotedBuilder for QueryBuilder {
    fn quote(&self) -> Quote {
        self.quote
    }
}

impl EscapeBuilder for QueryBuilder {}

impl TableRefBuilder for QueryBuilder {}

impl OperLeftAssocDecider for QueryBuilder {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // Copied from sea-query 0.32.7 backend/query_builder.rs `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

impl PrecedenceDecider for QueryBuilder {
    fn inner_expr_well_known_greater_precedence(
        &self, inner: &SimpleExpr, _outer_oper: &Oper,
    ) -> bool {
        // Atoms never need parentheses; anything compound keeps them
        matches!(inner, SimpleExpr::Column(_) | SimpleExpr::Value(_) | SimpleExpr::Keyword(_))
    }
}

impl sea_query::backend::QueryBuilder for QueryBuilder {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        (self.placeholder, self.numbered)
    }
}

/// Fully qualified `"table"."column"` reference.
pub fn table_column(table: &str, column: &str) -> ColumnRef {
    ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
}

/// Assembles a [`Statement`] from rendered SQL and collected values.
pub(crate) fn statement(sql: String, values: Values) -> Result<Statement> {
    Ok(Statement {
        sql,
        params: values_to_params(values)?,
    })
}

// Outbound conversion
pub(crate) fn values_to_params(values: Values) -> Result<Vec<DataType>> {
    values.into_iter().map(value_to_param).collect()
}

fn value_to_param(value: Value) -> Result<DataType> {
    let data_type = match value {
        Value::Bool(v) => DataType::Boolean(v),
        Value::TinyInt(v) => DataType::Int32(v.map(i32::from)),
        Value::SmallInt(v) => DataType::Int32(v.map(i32::from)),
        Value::Int(v) => DataType::Int32(v),
        Value::BigInt(v) => DataType::Int64(v),
        Value::TinyUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::SmallUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::Unsigned(v) => DataType::Uint32(v),
        Value::BigUnsigned(v) => DataType::Uint64(v),
        Value::Float(v) => DataType::Float(v),
        Value::Double(v) => DataType::Double(v),
        Value::String(v) => DataType::Str(v.map(|value| *value)),
        Value::Char(v) => DataType::Str(v.map(|ch| ch.to_string())),
        Value::Bytes(v) => DataType::Binary(v.map(|bytes| *bytes)),
        Value::ChronoDate(v) => DataType::Str(v.map(|value| {
            let date = *value;
            date.to_string() // "%Y-%m-%d"
        })),
        Value::ChronoDateTime(v) => DataType::Timestamp(v.map(|value| {
            let dt = *value;
            dt.to_string() // "%Y-%m-%d %H:%M:%S%.f"
        })),
        Value::ChronoDateTimeUtc(v) => DataType::Timestamp(v.map(|value| {
            let dt: DateTime<Utc> = *value;
            dt.to_rfc3339() // "%Y-%m-%dT%H:%M:%S%.f%:z"
        })),
        _ => {
            bail!("unsupported values require explicit conversion before building the query")
        }
    };
    Ok(data_type)
}
