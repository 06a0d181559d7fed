//! Pooled `rusqlite` backend.

pub mod config;
pub mod driver;
pub mod params;
pub mod query;

pub use config::{JournalMode, SqliteManager, SqliteOptions, SqliteOptionsBuilder};
pub use driver::SqliteDriver;
pub use params::row_value_to_sqlite_value;
pub use query::build_result_set;

use crate::connection::Connection;
use crate::error::SqlBridgeError;

/// Open a pooled `SQLite` database and wrap it in a [`Connection`].
///
/// # Errors
/// `ConfigError` for invalid options, `SqliteError` or `ConnectionError` when the pool cannot be
/// created.
pub async fn connect(options: SqliteOptions) -> Result<Connection, SqlBridgeError> {
    let driver = SqliteDriver::open(options).await?;
    Ok(Connection::new(driver))
}
