use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::driver::NativeDriver;
use crate::error::SqlBridgeError;
use crate::params::Params;
use crate::results::{ChangeResult, CustomDbRow};
use crate::schema::{SchemaGenerator, SqliteSchema, Table};
use crate::sql::QueryFragment;
use crate::statement::Statement;
use crate::types::RowValues;

/// Facade over a pooled native driver.
///
/// Clones share the same driver (and therefore the same pool). Every high-level call prepares
/// a fresh [`Statement`]; nothing is cached between calls.
#[derive(Clone)]
pub struct Connection {
    pub(crate) driver: Arc<dyn NativeDriver>,
    pub(crate) schema: Arc<dyn SchemaGenerator>,
}

impl Connection {
    #[must_use]
    pub fn new(driver: impl NativeDriver + 'static) -> Self {
        Self::from_driver(Arc::new(driver))
    }

    #[must_use]
    pub fn from_driver(driver: Arc<dyn NativeDriver>) -> Self {
        Self {
            driver,
            schema: Arc::new(SqliteSchema),
        }
    }

    /// Replace the SQL generator used by the typed helpers.
    #[must_use]
    pub fn with_schema(mut self, schema: impl SchemaGenerator + 'static) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    #[must_use]
    pub fn driver(&self) -> &Arc<dyn NativeDriver> {
        &self.driver
    }

    #[must_use]
    pub fn schema(&self) -> &dyn SchemaGenerator {
        self.schema.as_ref()
    }

    /// Scan `query` once and return a reusable statement.
    ///
    /// `params` become the statement's defaults; when empty, parameters carried by the query
    /// fragment itself are used instead.
    pub fn prepare(&self, query: impl QueryFragment, params: impl Into<Params>) -> Statement {
        let (text, carried) = query.to_sql().into_parts();
        Statement::new(
            Arc::clone(&self.driver),
            &text,
            params.into().or_defaults(&carried),
        )
    }

    /// # Errors
    /// See [`Statement::all`].
    pub async fn all(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Vec<CustomDbRow>, SqlBridgeError> {
        self.prepare(query, params).all(Params::None).await
    }

    /// `all`, materialized into `T`.
    ///
    /// # Errors
    /// See [`crate::TypedStatement::all`].
    pub async fn all_as<T: DeserializeOwned>(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Vec<T>, SqlBridgeError> {
        self.prepare(query, params)
            .with_result_type::<T>()
            .all(Params::None)
            .await
    }

    /// # Errors
    /// See [`Statement::one`].
    pub async fn one(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Option<CustomDbRow>, SqlBridgeError> {
        self.prepare(query, params).one(Params::None).await
    }

    /// `one`, materialized into `T`.
    ///
    /// # Errors
    /// See [`crate::TypedStatement::one`].
    pub async fn one_as<T: DeserializeOwned>(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Option<T>, SqlBridgeError> {
        self.prepare(query, params)
            .with_result_type::<T>()
            .one(Params::None)
            .await
    }

    /// # Errors
    /// See [`Statement::value`].
    pub async fn value(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Option<RowValues>, SqlBridgeError> {
        self.prepare(query, params).value(Params::None).await
    }

    /// # Errors
    /// See [`Statement::column`].
    pub async fn column(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Vec<RowValues>, SqlBridgeError> {
        self.prepare(query, params).column(Params::None).await
    }

    /// # Errors
    /// See [`Statement::arrays`].
    pub async fn arrays(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Vec<Vec<RowValues>>, SqlBridgeError> {
        self.prepare(query, params).arrays(Params::None).await
    }

    /// # Errors
    /// See [`Statement::array`].
    pub async fn array(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<Option<Vec<RowValues>>, SqlBridgeError> {
        self.prepare(query, params).array(Params::None).await
    }

    /// # Errors
    /// See [`Statement::exec`].
    pub async fn exec(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<ChangeResult, SqlBridgeError> {
        self.prepare(query, params).exec(Params::None).await
    }

    /// # Errors
    /// See [`Statement::run`].
    pub async fn run(
        &self,
        query: impl QueryFragment,
        params: impl Into<Params>,
    ) -> Result<(), SqlBridgeError> {
        self.prepare(query, params).run(Params::None).await
    }

    /// Names of user tables, sorted.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    pub async fn list_tables(&self) -> Result<Vec<String>, SqlBridgeError> {
        let names = self.column(self.schema.list_tables(), ()).await?;
        Ok(names
            .into_iter()
            .filter_map(|v| v.as_text().map(ToString::to_string))
            .collect())
    }

    /// Create the table declared by `T` if it does not exist.
    ///
    /// # Errors
    /// `SchemaError` for an empty declaration, or the driver's error unchanged.
    pub async fn create_table<T: Table>(&self) -> Result<(), SqlBridgeError> {
        let sql = self.schema.create_table(&T::table_def())?;
        self.run(sql, ()).await
    }

    /// Drop the table declared by `T` if it exists.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    pub async fn drop_table<T: Table>(&self) -> Result<(), SqlBridgeError> {
        let sql = self.schema.drop_table(&T::table_def());
        self.run(sql, ()).await
    }

    /// Release the pool. Statements prepared from this connection fail afterwards.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    pub async fn close(&self) -> Result<(), SqlBridgeError> {
        debug!("closing connection");
        self.driver.close().await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .field("schema", &self.schema)
            .finish()
    }
}
