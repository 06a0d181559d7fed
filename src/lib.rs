//! Statement preparation and parameter binding over an async, pooled SQL driver.
//!
//! SQL written with `$name` tokens is scanned once per statement and bound per call into
//! positional placeholders plus an ordered value list. Results come back as field-mapped rows,
//! arrays, single columns, scalars or serde-materialized structs.
//!
//! ```rust,no_run
//! use sql_bridge::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlBridgeError> {
//! let conn = SqliteOptionsBuilder::new("app.db").build().await?;
//! conn.run("CREATE TABLE IF NOT EXISTS contact (id INTEGER PRIMARY KEY, name TEXT)", ())
//!     .await?;
//! let stmt = conn.prepare("SELECT name FROM contact WHERE id = $id", ());
//! let name = stmt.value(Params::named([("id", 1)])).await?;
//! # let _ = name;
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod connection;
pub mod driver;
pub mod error;
pub mod materialize;
pub mod mutation;
pub mod params;
pub mod prelude;
pub mod results;
pub mod schema;
pub mod splitter;
pub mod sql;
pub mod statement;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use binder::{Binder, PlaceholderStyle, QueryDescriptor, normalize};
pub use connection::Connection;
pub use driver::NativeDriver;
pub use error::SqlBridgeError;
pub use materialize::materialize;
pub use mutation::MutationOptions;
pub use params::{FieldMap, Params};
pub use results::{ChangeResult, CustomDbRow, ResultSet};
pub use schema::{ColumnDef, SchemaGenerator, SqliteSchema, Table, TableDef};
pub use splitter::split_statements;
pub use sql::{QueryFragment, Sql};
pub use statement::{Statement, TypedStatement};
pub use types::RowValues;

#[cfg(feature = "sqlite")]
pub use sqlite::{JournalMode, SqliteDriver, SqliteOptions, SqliteOptionsBuilder, connect};
