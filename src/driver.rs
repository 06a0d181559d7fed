use std::fmt;

use async_trait::async_trait;

use crate::binder::PlaceholderStyle;
use crate::error::SqlBridgeError;
use crate::results::{ChangeResult, ResultSet};
use crate::types::RowValues;

/// The native client surface the adapter drives.
///
/// Implementations receive SQL that is already positional and values already in placeholder
/// order. Errors from the backend are returned as-is; the adapter never wraps or retries them.
#[async_trait]
pub trait NativeDriver: fmt::Debug + Send + Sync {
    /// Placeholder style the backend expects in normalized SQL.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    /// Run a statement that returns rows.
    ///
    /// The result carries column names and positional rows, so callers can derive either a
    /// field-mapped or an array-shaped view from one round trip.
    async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlBridgeError>;

    /// Run a statement for its side effects.
    async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ChangeResult, SqlBridgeError>;

    /// Blocking variant of [`query`](NativeDriver::query); async-only backends keep the default.
    ///
    /// # Errors
    /// The default returns [`SqlBridgeError::NotImplemented`].
    fn query_sync(&self, _sql: &str, _params: &[RowValues]) -> Result<ResultSet, SqlBridgeError> {
        Err(SqlBridgeError::NotImplemented(format!(
            "synchronous query is not supported by {}",
            std::any::type_name::<Self>()
        )))
    }

    /// Blocking variant of [`execute`](NativeDriver::execute).
    ///
    /// # Errors
    /// The default returns [`SqlBridgeError::NotImplemented`].
    fn execute_sync(
        &self,
        _sql: &str,
        _params: &[RowValues],
    ) -> Result<ChangeResult, SqlBridgeError> {
        Err(SqlBridgeError::NotImplemented(format!(
            "synchronous execute is not supported by {}",
            std::any::type_name::<Self>()
        )))
    }

    /// Release the underlying pool. Later calls fail.
    async fn close(&self) -> Result<(), SqlBridgeError>;
}
