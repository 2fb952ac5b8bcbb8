#![doc = include_str!("../README.md")]

//! # SQL Connection Capability
//!
//! Statements rendered by the ORM are executed through the [`Connection`]
//! trait. Any store able to run parameterized SQL and return rows can
//! implement it; [`SqlDefault`] is the bundled `SQLite` implementation.

#![forbid(unsafe_code)]

pub mod default_impl;
mod error;
mod resource;
mod traits;
mod types;

pub use crate::default_impl::{ConnectOptions, SqlDefault};
pub use crate::error::{Error, Result};
pub use crate::resource::Connection;
pub use crate::traits::{Backend, FromEnv};
pub use crate::types::{DataType, Field, Row};
