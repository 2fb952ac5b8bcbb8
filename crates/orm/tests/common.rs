//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use sea_query::Value;
use tabula_orm::{Binding, Column, ColumnType, Entity, Fields, ID_COLUMN, Metadata};
use tabula_sql::{Backend, ConnectOptions, Connection, SqlDefault};

pub const ID: i64 = 100;
pub const DEFAULT_VALUE: i64 = 12345;

// Test entities: `some` <- `other` <- `another`, plus a table with unique
// columns.

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SomeModel {
    pub id: Option<i64>,
    pub value: Option<f64>,
    pub name: Option<String>,
    pub flag: Option<bool>,
    pub date: Option<DateTime<Utc>>,
}

static SOME: LazyLock<Metadata> = LazyLock::new(|| {
    Metadata::new("some", || Box::<SomeModel>::default())
        .with_column(ID_COLUMN, Column::new(ColumnType::Int))
        .with_column("value", Column::new(ColumnType::Real))
        .with_column("name", Column::new(ColumnType::Text))
        .with_column("flag", Column::new(ColumnType::Bool))
        .with_column("date", Column::new(ColumnType::Datetime))
});

impl Entity for SomeModel {
    fn metadata(&self) -> &'static Metadata {
        &SOME
    }

    fn fields(&mut self) -> Fields<'_> {
        Fields::from([
            (ID_COLUMN, Binding::Int(&mut self.id)),
            ("value", Binding::Float(&mut self.value)),
            ("name", Binding::Text(&mut self.name)),
            ("flag", Binding::Bool(&mut self.flag)),
            ("date", Binding::Time(&mut self.date)),
        ])
    }
}

impl SomeModel {
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OtherModel {
    pub id: Option<i64>,
    pub some_id: Option<i64>,
    pub value: Option<f64>,
    pub name: Option<String>,
    pub flag: Option<bool>,
    pub date: Option<DateTime<Utc>>,
}

static OTHER: LazyLock<Metadata> = LazyLock::new(|| {
    Metadata::new("other", || Box::<OtherModel>::default())
        .with_column(ID_COLUMN, Column::new(ColumnType::Int))
        .with_column("some_id", Column::new(ColumnType::Int).nullable())
        .with_column("value", Column::new(ColumnType::Real).nullable())
        .with_column("name", Column::new(ColumnType::Text).nullable())
        .with_column("flag", Column::new(ColumnType::Bool).nullable())
        .with_column("date", Column::new(ColumnType::Datetime).nullable())
        .with_relation("some")
});

impl Entity for OtherModel {
    fn metadata(&self) -> &'static Metadata {
        &OTHER
    }

    fn fields(&mut self) -> Fields<'_> {
        Fields::from([
            (ID_COLUMN, Binding::Int(&mut self.id)),
            ("some_id", Binding::Int(&mut self.some_id)),
            ("value", Binding::Float(&mut self.value)),
            ("name", Binding::Text(&mut self.name)),
            ("flag", Binding::Bool(&mut self.flag)),
            ("date", Binding::Time(&mut self.date)),
        ])
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnotherModel {
    pub id: Option<i64>,
    pub other_id: Option<i64>,
    pub default_value: Option<i64>,
}

static ANOTHER: LazyLock<Metadata> = LazyLock::new(|| {
    Metadata::new("another", || Box::<AnotherModel>::default())
        .with_column(ID_COLUMN, Column::new(ColumnType::Int))
        .with_column("other_id", Column::new(ColumnType::Int).nullable())
        .with_column("default_value", Column::new(ColumnType::Int).with_default(DEFAULT_VALUE))
        .with_relation("other")
});

impl Entity for AnotherModel {
    fn metadata(&self) -> &'static Metadata {
        &ANOTHER
    }

    fn fields(&mut self) -> Fields<'_> {
        Fields::from([
            (ID_COLUMN, Binding::Int(&mut self.id)),
            ("other_id", Binding::Int(&mut self.other_id)),
            ("default_value", Binding::Int(&mut self.default_value)),
        ])
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UniqueModel {
    pub id: Option<i64>,
    pub unique_field: Option<i64>,
    pub another_unique_field: Option<i64>,
}

static UNIQUE: LazyLock<Metadata> = LazyLock::new(|| {
    Metadata::new("unique_table", || Box::<UniqueModel>::default())
        .with_column(ID_COLUMN, Column::new(ColumnType::Int))
        .with_column("unique_field", Column::new(ColumnType::Int).unique())
        .with_column("another_unique_field", Column::new(ColumnType::Int).unique())
});

impl Entity for UniqueModel {
    fn metadata(&self) -> &'static Metadata {
        &UNIQUE
    }

    fn fields(&mut self) -> Fields<'_> {
        Fields::from([
            (ID_COLUMN, Binding::Int(&mut self.id)),
            ("unique_field", Binding::Int(&mut self.unique_field)),
            ("another_unique_field", Binding::Int(&mut self.another_unique_field)),
        ])
    }
}

pub fn some_model() -> SomeModel {
    SomeModel {
        id: Some(ID),
        value: Some(123.0),
        name: Some("abc".to_string()),
        flag: Some(true),
        date: DateTime::from_timestamp(1_000_000, 0),
    }
}

pub fn some_different_model() -> SomeModel {
    SomeModel {
        id: Some(2 * ID),
        value: Some(789.0),
        name: Some("xyz".to_string()),
        flag: Some(false),
        date: DateTime::from_timestamp(9_000_000, 0),
    }
}

pub fn other_model() -> OtherModel {
    OtherModel {
        id: Some(ID),
        some_id: Some(ID),
        value: Some(456.0),
        name: Some("pqr".to_string()),
        flag: Some(false),
        date: DateTime::from_timestamp(2_000_000, 0),
    }
}

pub fn another_model() -> AnotherModel {
    AnotherModel {
        id: Some(ID),
        other_id: Some(ID),
        default_value: Some(0),
    }
}

pub fn unique_model() -> UniqueModel {
    UniqueModel {
        id: Some(ID),
        unique_field: Some(ID + 1),
        another_unique_field: Some(ID + 2),
    }
}

/// Downcasts a materialized entity, panicking on a type mismatch.
#[allow(clippy::missing_panics_doc)]
pub fn entity<T: Entity + Clone>(value: &dyn Entity) -> T {
    value.downcast_ref::<T>().cloned().unwrap_or_else(|| panic!("unexpected entity {value:?}"))
}

/// An in-memory `SQLite` database with a table for every test entity.
pub struct Fixture {
    pub db: SqlDefault,
}

enum Outcome {
    Rollback,
    Sql(tabula_sql::Error),
}

impl From<tabula_sql::Error> for Outcome {
    fn from(err: tabula_sql::Error) -> Self {
        Self::Sql(err)
    }
}

impl Fixture {
    #[allow(clippy::missing_panics_doc)]
    pub fn new() -> Self {
        init_tracing();

        let db = SqlDefault::connect_with(ConnectOptions {
            database: ":memory:".to_string(),
            busy_timeout_ms: "100".to_string(),
        })
        .expect("connect");

        for metadata in [&*SOME, &*OTHER, &*ANOTHER, &*UNIQUE] {
            db.exec(create_table(metadata), vec![]).expect("create table");
        }
        Self { db }
    }

    /// Runs `f` inside a transaction that is always rolled back.
    #[allow(clippy::missing_panics_doc)]
    pub fn in_transaction(&self, f: impl FnOnce(&dyn Connection)) {
        let result: Result<(), Outcome> = self.db.transaction(|conn| {
            f(conn);
            Err(Outcome::Rollback)
        });
        match result {
            Err(Outcome::Rollback) => {}
            Err(Outcome::Sql(err)) => panic!("transaction failed: {err}"),
            Ok(()) => unreachable!("transaction always rolls back"),
        }
    }
}

/// Renders `CREATE TABLE` for an entity from its metadata.
pub fn create_table(metadata: &Metadata) -> String {
    let columns: Vec<String> = metadata
        .columns()
        .map(|(name, column)| {
            if name == ID_COLUMN {
                return format!(r#""{name}" INTEGER PRIMARY KEY"#);
            }

            let sql_type = match column.sql_type {
                ColumnType::Int => "INTEGER",
                ColumnType::Real => "REAL",
                ColumnType::Text | ColumnType::Datetime => "TEXT",
                ColumnType::Bool => "BOOLEAN",
            };
            let mut definition = format!(r#""{name}" {sql_type}"#);
            if !column.nullable {
                definition.push_str(" NOT NULL");
            }
            if column.unique {
                definition.push_str(" UNIQUE");
            }
            if let Some(default) = &column.default {
                definition.push_str(&format!(" DEFAULT {}", literal(default)));
            }
            definition
        })
        .collect();

    format!(r#"CREATE TABLE "{}" ({})"#, metadata.table(), columns.join(", "))
}

fn literal(value: &Value) -> String {
    match value {
        Value::BigInt(Some(v)) => v.to_string(),
        Value::Int(Some(v)) => v.to_string(),
        Value::Double(Some(v)) => v.to_string(),
        Value::Bool(Some(v)) => i32::from(*v).to_string(),
        Value::String(Some(v)) => format!("'{}'", v.replace('\'', "''")),
        _ => "NULL".to_string(),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and
/// parentheses, and normalizing whitespace. String literals are kept as is.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' | '(' | ')' if !in_single_quote => {}
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// Identifier quotes and parentheses are ignored on both sides, so fragments
/// read as plain SQL: `"FROM some LEFT JOIN other"`.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}
