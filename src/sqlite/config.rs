use std::sync::Arc;
use std::time::Duration;

use bb8::ManageConnection;
use clap::ValueEnum;
use serde::Deserialize;

use crate::connection::Connection;
use crate::error::SqlBridgeError;

/// A pooled handle; the mutex serializes use of the non-`Sync` rusqlite connection.
pub type SharedSqliteConnection = Arc<tokio::sync::Mutex<rusqlite::Connection>>;

/// `PRAGMA journal_mode` applied to every new connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    #[must_use]
    pub fn as_pragma(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

fn default_max_connections() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

/// Options for configuring a `SQLite` pool.
///
/// Deserializable so it can live in an application config file; only `db_path` is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
            journal_mode: JournalMode::default(),
        }
    }

    /// # Errors
    /// `ConfigError` when the pool size is zero or the path is empty.
    pub fn validate(&self) -> Result<(), SqlBridgeError> {
        if self.db_path.trim().is_empty() {
            return Err(SqlBridgeError::ConfigError(
                "db_path must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(SqlBridgeError::ConfigError(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.opts.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connection_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.opts.journal_mode = mode;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Create the pool and wrap it in a [`Connection`].
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError` if the options are invalid or pool creation fails.
    pub async fn build(self) -> Result<Connection, SqlBridgeError> {
        super::connect(self.finish()).await
    }
}

/// bb8 manager for rusqlite connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
    busy_timeout: Duration,
    journal_mode: JournalMode,
}

impl SqliteManager {
    #[must_use]
    pub fn new(options: &SqliteOptions) -> Self {
        Self {
            db_path: options.db_path.clone(),
            busy_timeout: Duration::from_millis(options.busy_timeout_ms),
            journal_mode: options.journal_mode,
        }
    }

    fn open(&self) -> Result<rusqlite::Connection, rusqlite::Error> {
        let conn = rusqlite::Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};",
            self.journal_mode.as_pragma()
        ))?;
        Ok(conn)
    }
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> SqlBridgeError {
    SqlBridgeError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = SqlBridgeError;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let manager = self.clone();
        async move {
            let conn = tokio::task::spawn_blocking(move || manager.open())
                .await
                .map_err(join_error)??;
            Ok(Arc::new(tokio::sync::Mutex::new(conn)))
        }
    }

    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let conn = Arc::clone(conn);
        async move {
            tokio::task::spawn_blocking(move || {
                conn.blocking_lock().query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(join_error)??;
            Ok(())
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fill_defaults_when_deserialized() {
        let opts: SqliteOptions =
            serde_json::from_str(r#"{"db_path": "app.db", "journal_mode": "delete"}"#).unwrap();
        assert_eq!(opts.max_connections, 4);
        assert_eq!(opts.busy_timeout_ms, 5_000);
        assert_eq!(opts.connection_timeout_ms, 30_000);
        assert_eq!(opts.journal_mode, JournalMode::Delete);
    }

    #[test]
    fn zero_connections_is_a_config_error() {
        let opts = SqliteOptionsBuilder::new("app.db").max_connections(0).finish();
        assert!(matches!(opts.validate(), Err(SqlBridgeError::ConfigError(_))));
    }

    #[test]
    fn builder_sets_timeouts() {
        let opts = SqliteOptionsBuilder::new("app.db")
            .busy_timeout(Duration::from_millis(250))
            .connection_timeout(Duration::from_secs(2))
            .journal_mode(JournalMode::Memory)
            .finish();
        assert_eq!(opts.busy_timeout_ms, 250);
        assert_eq!(opts.connection_timeout_ms, 2_000);
        assert_eq!(opts.journal_mode.as_pragma(), "MEMORY");
    }
}
