use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;

use sea_query::Value;

use crate::binding::Fields;
use crate::error::ConfigError;

/// Name of the primary key column every entity carries.
pub const ID_COLUMN: &str = "id";

/// A storage entity: a value with declared metadata and typed column
/// bindings.
///
/// # Examples
///
/// ```ignore
/// static METADATA: LazyLock<Metadata> = LazyLock::new(|| {
///     Metadata::new("posts", || Box::new(Post::default()))
///         .with_column("id", Column::new(ColumnType::Int))
///         .with_column("title", Column::new(ColumnType::Text))
///         .with_relation("users")
/// });
///
/// impl Entity for Post {
///     fn metadata(&self) -> &'static Metadata {
///         &METADATA
///     }
///
///     fn fields(&mut self) -> Fields<'_> {
///         Fields::from([
///             ("id", Binding::Int(&mut self.id)),
///             ("title", Binding::Text(&mut self.title)),
///             ("users_id", Binding::Int(&mut self.users_id)),
///         ])
///     }
/// }
/// ```
pub trait Entity: Any + Debug {
    /// Metadata shared by every instance of the entity type.
    fn metadata(&self) -> &'static Metadata;

    /// Bindings for every column declared in the metadata.
    fn fields(&mut self) -> Fields<'_>;
}

impl dyn Entity {
    /// Returns the entity as `T` if it is one.
    #[must_use]
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }

    /// Converts a boxed entity into a concrete `T`, or `None` if it is a
    /// different type.
    #[must_use]
    pub fn downcast<T: Entity>(self: Box<Self>) -> Option<Box<T>> {
        let any: Box<dyn Any> = self;
        any.downcast().ok()
    }
}

/// SQL scalar kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Integer.
    Int,
    /// Floating point.
    Real,
    /// Text.
    Text,
    /// Boolean.
    Bool,
    /// Timestamp.
    Datetime,
}

/// Column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Scalar kind.
    pub sql_type: ColumnType,
    /// Whether `NULL` is allowed.
    pub nullable: bool,
    /// Whether values must be unique.
    pub unique: bool,
    /// Value the store substitutes when an insert omits the column.
    pub default: Option<Value>,
}

impl Column {
    /// A required column of the given kind.
    #[must_use]
    pub const fn new(sql_type: ColumnType) -> Self {
        Self {
            sql_type,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    /// Allows `NULL`.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Requires unique values.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the store default.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether the store fills in a value when the column is omitted.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Declarative description of an entity's table.
///
/// Built once per entity type and shared by reference.
#[derive(Debug)]
pub struct Metadata {
    table: &'static str,
    columns: BTreeMap<&'static str, Column>,
    relations: BTreeMap<&'static str, String>,
    factory: fn() -> Box<dyn Entity>,
}

impl Metadata {
    /// Metadata for `table` with no columns. `factory` creates a blank
    /// instance to materialize rows into.
    #[must_use]
    pub const fn new(table: &'static str, factory: fn() -> Box<dyn Entity>) -> Self {
        Self {
            table,
            columns: BTreeMap::new(),
            relations: BTreeMap::new(),
            factory,
        }
    }

    /// Adds a column definition.
    #[must_use]
    pub fn with_column(mut self, name: &'static str, column: Column) -> Self {
        self.columns.insert(name, column);
        self
    }

    /// Declares a relation to `table` through the conventional
    /// `<table>_id` column.
    #[must_use]
    pub fn with_relation(self, table: &'static str) -> Self {
        let column = format!("{table}_{ID_COLUMN}");
        self.with_relation_column(table, column)
    }

    /// Declares a relation to `table` through `column`, which references
    /// that table's primary key.
    #[must_use]
    pub fn with_relation_column(mut self, table: &'static str, column: impl Into<String>) -> Self {
        self.relations.insert(table, column.into());
        self
    }

    /// Table name.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Column definitions, ordered by name.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Column)> {
        self.columns.iter().map(|(name, column)| (*name, column))
    }

    /// Definition of the named column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Local column referencing the primary key of `table`.
    #[must_use]
    pub fn relation(&self, table: &str) -> Option<&str> {
        self.relations.get(table).map(String::as_str)
    }

    /// A blank instance of the entity.
    #[must_use]
    pub fn create(&self) -> Box<dyn Entity> {
        (self.factory)()
    }

    pub(crate) fn check_column(&self, name: &str) -> Result<(), ConfigError> {
        if self.columns.contains_key(name) {
            Ok(())
        } else {
            Err(ConfigError::UnknownColumn {
                table: self.table,
                column: name.to_string(),
            })
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.table.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::binding::Binding;

    #[derive(Debug, Default, PartialEq)]
    struct Post {
        id: Option<i64>,
        title: Option<String>,
    }

    static POSTS: LazyLock<Metadata> = LazyLock::new(|| {
        Metadata::new("posts", || Box::<Post>::default())
            .with_column(ID_COLUMN, Column::new(ColumnType::Int))
            .with_column("title", Column::new(ColumnType::Text).nullable().with_default("untitled"))
            .with_relation("users")
            .with_relation_column("tags", "tag_ref")
    });

    impl Entity for Post {
        fn metadata(&self) -> &'static Metadata {
            &POSTS
        }

        fn fields(&mut self) -> Fields<'_> {
            Fields::from([
                (ID_COLUMN, Binding::Int(&mut self.id)),
                ("title", Binding::Text(&mut self.title)),
            ])
        }
    }

    #[test]
    fn relations() {
        assert_eq!(POSTS.relation("users"), Some("users_id"));
        assert_eq!(POSTS.relation("tags"), Some("tag_ref"));
        assert_eq!(POSTS.relation("comments"), None);
    }

    #[test]
    fn columns() {
        let title = POSTS.column("title").unwrap();
        assert!(title.nullable);
        assert!(title.has_default());
        assert!(!POSTS.column(ID_COLUMN).unwrap().has_default());
        assert_eq!(POSTS.columns().map(|(name, _)| name).collect::<Vec<_>>(), vec!["id", "title"]);

        POSTS.check_column("title").unwrap();
        let err = POSTS.check_column("body").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownColumn {
                table: "posts",
                column: "body".to_string()
            }
        );
    }

    #[test]
    fn empty_table() {
        let metadata = Metadata::new("", || Box::<Post>::default());
        assert_eq!(metadata.validate(), Err(ConfigError::EmptyTable));
    }

    #[test]
    fn create_and_downcast() {
        let entity = POSTS.create();
        assert_eq!(entity.downcast_ref::<Post>(), Some(&Post::default()));
        assert_eq!(entity.downcast::<Post>().map(|post| *post), Some(Post::default()));
    }
}
