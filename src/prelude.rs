//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::binder::{PlaceholderStyle, QueryDescriptor, normalize};
pub use crate::connection::Connection;
pub use crate::driver::NativeDriver;
pub use crate::error::SqlBridgeError;
pub use crate::materialize::materialize;
pub use crate::mutation::MutationOptions;
pub use crate::params::{FieldMap, Params};
pub use crate::results::{ChangeResult, CustomDbRow, ResultSet};
pub use crate::schema::{ColumnDef, SchemaGenerator, Table, TableDef};
pub use crate::splitter::split_statements;
pub use crate::sql::{QueryFragment, Sql};
pub use crate::statement::{Statement, TypedStatement};
pub use crate::types::RowValues;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{JournalMode, SqliteOptions, SqliteOptionsBuilder, connect};
