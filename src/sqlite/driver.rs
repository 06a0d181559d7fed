use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bb8::Pool;
use tokio::sync::RwLock;
use tracing::debug;

use super::config::{SharedSqliteConnection, SqliteManager, SqliteOptions, join_error};
use super::params::convert_params;
use super::query::build_result_set;
use crate::binder::{PlaceholderStyle, statement_keyword};
use crate::driver::NativeDriver;
use crate::error::SqlBridgeError;
use crate::results::{ChangeResult, ResultSet};
use crate::types::RowValues;

/// [`NativeDriver`] over a bb8 pool of rusqlite connections.
///
/// Each call checks out a connection and runs the blocking rusqlite work on tokio's blocking
/// pool. Async-only: the sync variants keep their `NotImplemented` defaults.
pub struct SqliteDriver {
    pool: RwLock<Option<Pool<SqliteManager>>>,
    db_path: String,
}

impl SqliteDriver {
    /// Validate `options`, build the pool and check out one connection as a smoke test.
    ///
    /// # Errors
    /// `ConfigError` for invalid options, `SqliteError` if the database cannot be opened.
    pub async fn open(options: SqliteOptions) -> Result<Self, SqlBridgeError> {
        options.validate()?;
        let pool = Pool::builder()
            .max_size(options.max_connections)
            .connection_timeout(Duration::from_millis(options.connection_timeout_ms))
            .build(SqliteManager::new(&options))
            .await?;
        {
            let _smoke = pool.get().await.map_err(|e| {
                SqlBridgeError::ConnectionError(format!("sqlite pool checkout failed: {e}"))
            })?;
        }
        debug!(
            db_path = %options.db_path,
            max_connections = options.max_connections,
            journal_mode = options.journal_mode.as_pragma(),
            "sqlite pool created"
        );
        Ok(Self {
            pool: RwLock::new(Some(pool)),
            db_path: options.db_path,
        })
    }

    async fn pool(&self) -> Result<Pool<SqliteManager>, SqlBridgeError> {
        self.pool.read().await.clone().ok_or_else(|| {
            SqlBridgeError::ConnectionError(format!("sqlite pool for {} is closed", self.db_path))
        })
    }

    async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlBridgeError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlBridgeError> + Send + 'static,
        R: Send + 'static,
    {
        let pool = self.pool().await?;
        let pooled = pool.get().await.map_err(|e| {
            SqlBridgeError::ConnectionError(format!("sqlite pool checkout failed: {e}"))
        })?;
        run_blocking(Arc::clone(&*pooled), func).await
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlBridgeError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlBridgeError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(join_error)?
}

/// Whether `sql` is an INSERT or REPLACE, the only statements that generate a rowid.
fn generates_rowid(sql: &str) -> bool {
    matches!(
        statement_keyword(sql).as_deref(),
        Some("INSERT" | "REPLACE")
    )
}

fn execute_blocking(
    conn: &mut rusqlite::Connection,
    sql: &str,
    values: &[rusqlite::types::Value],
) -> Result<ChangeResult, SqlBridgeError> {
    let mut stmt = conn.prepare(sql)?;
    let changes = match stmt.execute(rusqlite::params_from_iter(values.iter())) {
        Ok(changes) => changes,
        // Statements that return rows (PRAGMA, SELECT) are stepped to completion instead.
        Err(rusqlite::Error::ExecuteReturnedResults) => {
            let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
            while rows.next()?.is_some() {}
            0
        }
        Err(e) => return Err(e.into()),
    };
    drop(stmt);

    let changes = u64::try_from(changes).unwrap_or(u64::MAX);
    let last_insert_rowid = if changes > 0 && generates_rowid(sql) {
        u64::try_from(conn.last_insert_rowid()).unwrap_or(0)
    } else {
        0
    };
    Ok(ChangeResult::new(changes, last_insert_rowid))
}

#[async_trait]
impl NativeDriver for SqliteDriver {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlBridgeError> {
        let sql = sql.to_owned();
        let values = convert_params(params);
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            build_result_set(&mut stmt, &values)
        })
        .await
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ChangeResult, SqlBridgeError> {
        let sql = sql.to_owned();
        let values = convert_params(params);
        self.with_connection(move |conn| execute_blocking(conn, &sql, &values))
            .await
    }

    async fn close(&self) -> Result<(), SqlBridgeError> {
        if self.pool.write().await.take().is_some() {
            debug!(db_path = %self.db_path, "sqlite pool closed");
        }
        Ok(())
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}
