//! Metadata-driven query builder for SQL databases.
//!
//! Entities describe their table declaratively with [`Metadata`] and expose
//! typed [`Binding`]s for their columns. A [`Query`] combines an entity with
//! a [`FieldMask`], a [`Filter`] and a tree of joined queries, renders
//! parameterized SQL through ``SeaQuery``, runs it on a
//! [`Connection`](tabula_sql::Connection) and scans the rows back into fresh
//! entities.
//!
//! # Quick Start
//!
//! ## Define an Entity
//!
//! ```ignore
//! use std::sync::LazyLock;
//!
//! #[derive(Debug, Default)]
//! pub struct Post {
//!     pub id: Option<i64>,
//!     pub title: Option<String>,
//!     pub users_id: Option<i64>,
//! }
//!
//! static POSTS: LazyLock<Metadata> = LazyLock::new(|| {
//!     Metadata::new("posts", || Box::<Post>::default())
//!         .with_column("id", Column::new(ColumnType::Int))
//!         .with_column("title", Column::new(ColumnType::Text))
//!         .with_column("users_id", Column::new(ColumnType::Int).nullable())
//!         .with_relation("users")
//! });
//!
//! impl Entity for Post {
//!     fn metadata(&self) -> &'static Metadata {
//!         &POSTS
//!     }
//!
//!     fn fields(&mut self) -> Fields<'_> {
//!         Fields::from([
//!             ("id", Binding::Int(&mut self.id)),
//!             ("title", Binding::Text(&mut self.title)),
//!             ("users_id", Binding::Int(&mut self.users_id)),
//!         ])
//!     }
//! }
//! ```
//!
//! ## CRUD Operations
//!
//! ```ignore
//! // Insert, letting the database assign the id
//! let id = Query::new()
//!     .from(post)
//!     .select(FieldMask::exclude(["id"]))
//!     .insert(&conn)?;
//!
//! // Fetch a post with its author, if any
//! let row = Query::new()
//!     .from(Post::default())
//!     .r#where(Filter::eq("posts.id", id))
//!     .join(Query::new().from(User::default()).nullable())
//!     .fetch(&conn)?;
//! let post = row[0].downcast_ref::<Post>();
//!
//! // Update only the title
//! Query::new()
//!     .from(changed)
//!     .select(FieldMask::include(["title"]))
//!     .r#where(Filter::eq("id", id))
//!     .update(&conn)?;
//!
//! // Page through posts
//! let page = Query::new()
//!     .from(Post::default())
//!     .order_by("title", Order::Asc)
//!     .limit(10)
//!     .offset(20)
//!     .list(&conn)?;
//!
//! // Delete
//! Query::new().from(Post::default()).r#where(Filter::eq("id", id)).delete(&conn)?;
//! ```
//!
//! ## Joins
//!
//! A joined query is attached to its parent through the relation declared
//! in metadata (`posts.users_id` references `users.id` above), unless it
//! carries its own filter, which then becomes the join condition. Nullable
//! joins render as `LEFT JOIN`; a join with joins of its own renders as a
//! parenthesized group so its children are resolved first. Rows come back
//! as the root entity followed by every joined entity in the order the
//! joins were added, depth first.

mod binding;
mod delete;
mod entity;
mod error;
mod filter;
mod insert;
mod join;
mod mask;
mod query;
mod select;
mod statement;
mod update;

pub use binding::{Binding, Fields};
pub use entity::{Column, ColumnType, Entity, ID_COLUMN, Metadata};
pub use error::{ConfigError, Error, Result};
pub use filter::Filter;
pub use mask::FieldMask;
pub use query::{Order, Query};
pub use statement::{QueryBuilder, Statement, table_column};
// Re-export basic SQL types for use in query parameters and custom value conversions.
pub use tabula_sql::{DataType, Field, Row};
