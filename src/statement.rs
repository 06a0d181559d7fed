use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::binder::{Binder, QueryDescriptor};
use crate::driver::NativeDriver;
use crate::error::SqlBridgeError;
use crate::materialize::{materialize, materialize_row};
use crate::params::Params;
use crate::results::{ChangeResult, CustomDbRow, ResultSet};
use crate::splitter::split_statements;
use crate::types::RowValues;

/// A scanned SQL template bound to a driver.
///
/// Cloning is cheap and every call binds its own parameters, so one statement can be shared
/// across tasks. Parameters given at prepare time are used whenever a call passes an empty
/// source.
///
/// ```rust,no_run
/// use sql_bridge::prelude::*;
///
/// # async fn demo(conn: &Connection) -> Result<(), SqlBridgeError> {
/// let stmt = conn.prepare("SELECT name FROM contact WHERE id = $id", ());
/// let name = stmt.value(Params::named([("id", 1)])).await?;
/// let names = stmt.column(Params::named([("id", 2)])).await?;
/// # let _ = (name, names);
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct Statement {
    driver: Arc<dyn NativeDriver>,
    binder: Arc<Binder>,
    defaults: Params,
}

impl Statement {
    pub(crate) fn new(driver: Arc<dyn NativeDriver>, sql: &str, defaults: Params) -> Self {
        let binder = Binder::new(sql, driver.placeholder_style());
        Self {
            driver,
            binder: Arc::new(binder),
            defaults,
        }
    }

    /// SQL as written by the caller.
    #[must_use]
    pub fn original_sql(&self) -> &str {
        self.binder.original_sql()
    }

    /// SQL as sent to the driver.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.binder.sql()
    }

    /// Bind a parameter source without executing.
    ///
    /// # Errors
    /// Returns the binder's `MissingParameter` / `InvalidParameterShape` errors.
    pub fn bind(&self, params: impl Into<Params>) -> Result<QueryDescriptor, SqlBridgeError> {
        self.binder.bind(params.into().or_defaults(&self.defaults))
    }

    /// Attach a row type; rows from `all`/`one` on the returned value are materialized into `T`.
    #[must_use]
    pub fn with_result_type<T: DeserializeOwned>(&self) -> TypedStatement<T> {
        TypedStatement {
            inner: self.clone(),
            _marker: PhantomData,
        }
    }

    async fn fetch(&self, params: Params, op: &'static str) -> Result<ResultSet, SqlBridgeError> {
        let descriptor = self.bind(params)?;
        debug!(op, sql = %descriptor.sql(), values = descriptor.values().len(), "query");
        self.driver
            .query(descriptor.sql(), descriptor.values())
            .await
    }

    /// Every matching row; empty when nothing matches.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn all(&self, params: impl Into<Params>) -> Result<Vec<CustomDbRow>, SqlBridgeError> {
        Ok(self.fetch(params.into(), "all").await?.results)
    }

    /// First row, or `None`.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn one(
        &self,
        params: impl Into<Params>,
    ) -> Result<Option<CustomDbRow>, SqlBridgeError> {
        Ok(self.fetch(params.into(), "one").await?.into_iter().next())
    }

    /// Every row as positional values, column order preserved.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn arrays(
        &self,
        params: impl Into<Params>,
    ) -> Result<Vec<Vec<RowValues>>, SqlBridgeError> {
        let rows = self.fetch(params.into(), "arrays").await?;
        Ok(rows.into_iter().map(CustomDbRow::into_values).collect())
    }

    /// First row as positional values, or `None`.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn array(
        &self,
        params: impl Into<Params>,
    ) -> Result<Option<Vec<RowValues>>, SqlBridgeError> {
        let rows = self.fetch(params.into(), "array").await?;
        Ok(rows.into_iter().next().map(CustomDbRow::into_values))
    }

    /// First column of every row.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn column(
        &self,
        params: impl Into<Params>,
    ) -> Result<Vec<RowValues>, SqlBridgeError> {
        let rows = self.fetch(params.into(), "column").await?;
        Ok(rows.into_iter().map(first_value).collect())
    }

    /// First column of the first row, or `None` when no row matched.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn value(
        &self,
        params: impl Into<Params>,
    ) -> Result<Option<RowValues>, SqlBridgeError> {
        let rows = self.fetch(params.into(), "value").await?;
        Ok(rows.into_iter().next().map(first_value))
    }

    /// Execute an INSERT/UPDATE/DELETE.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the driver's error unchanged.
    pub async fn exec(&self, params: impl Into<Params>) -> Result<ChangeResult, SqlBridgeError> {
        let descriptor = self.bind(params)?;
        debug!(sql = %descriptor.sql(), values = descriptor.values().len(), "exec");
        self.driver
            .execute(descriptor.sql(), descriptor.values())
            .await
    }

    /// Execute for side effects only.
    ///
    /// When the source (after defaults) is empty, or binds no values, the SQL is split into
    /// statements and each one runs in order with no parameters, stopping at the first
    /// failure. Any named slots in a split script therefore read as `NULL`. Otherwise it runs
    /// as one statement.
    ///
    /// # Errors
    /// Returns binding errors before any driver call, or the first driver error.
    pub async fn run(&self, params: impl Into<Params>) -> Result<(), SqlBridgeError> {
        let descriptor = self.bind(params)?;
        if !runs_as_script(&descriptor) {
            debug!(sql = %descriptor.sql(), values = descriptor.values().len(), "run");
            self.driver
                .execute(descriptor.sql(), descriptor.values())
                .await?;
            return Ok(());
        }

        let statements = split_statements(descriptor.sql());
        debug!(statements = statements.len(), "run script");
        for (step, sql) in statements.iter().enumerate() {
            trace!(step, sql = %sql, "run statement");
            self.driver.execute(sql, &[]).await?;
        }
        Ok(())
    }

    /// Blocking `all`.
    ///
    /// # Errors
    /// [`SqlBridgeError::NotImplemented`] on async-only drivers.
    pub fn all_sync(&self, params: impl Into<Params>) -> Result<Vec<CustomDbRow>, SqlBridgeError> {
        let descriptor = self.bind(params)?;
        Ok(self
            .driver
            .query_sync(descriptor.sql(), descriptor.values())?
            .results)
    }

    /// Blocking `one`.
    ///
    /// # Errors
    /// [`SqlBridgeError::NotImplemented`] on async-only drivers.
    pub fn one_sync(
        &self,
        params: impl Into<Params>,
    ) -> Result<Option<CustomDbRow>, SqlBridgeError> {
        Ok(self.all_sync(params)?.into_iter().next())
    }

    /// Blocking `value`.
    ///
    /// # Errors
    /// [`SqlBridgeError::NotImplemented`] on async-only drivers.
    pub fn value_sync(
        &self,
        params: impl Into<Params>,
    ) -> Result<Option<RowValues>, SqlBridgeError> {
        Ok(self.one_sync(params)?.map(first_value))
    }

    /// Blocking `exec`.
    ///
    /// # Errors
    /// [`SqlBridgeError::NotImplemented`] on async-only drivers.
    pub fn exec_sync(&self, params: impl Into<Params>) -> Result<ChangeResult, SqlBridgeError> {
        let descriptor = self.bind(params)?;
        self.driver
            .execute_sync(descriptor.sql(), descriptor.values())
    }

    /// Blocking `run`, with the same splitting rule as [`run`](Statement::run).
    ///
    /// # Errors
    /// [`SqlBridgeError::NotImplemented`] on async-only drivers.
    pub fn run_sync(&self, params: impl Into<Params>) -> Result<(), SqlBridgeError> {
        let descriptor = self.bind(params)?;
        if !runs_as_script(&descriptor) {
            self.driver
                .execute_sync(descriptor.sql(), descriptor.values())?;
            return Ok(());
        }
        for sql in split_statements(descriptor.sql()) {
            self.driver.execute_sync(&sql, &[])?;
        }
        Ok(())
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.binder.sql())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

fn runs_as_script(descriptor: &QueryDescriptor) -> bool {
    descriptor.original_params().is_empty() || descriptor.values().is_empty()
}

fn first_value(row: CustomDbRow) -> RowValues {
    row.into_values().into_iter().next().unwrap_or(RowValues::Null)
}

/// A [`Statement`] whose row-shaped results are materialized into `T`.
///
/// Only `all` and `one` materialize; the positional views stay on [`statement`](Self::statement).
pub struct TypedStatement<T> {
    inner: Statement,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> TypedStatement<T> {
    /// Every matching row as `T`.
    ///
    /// # Errors
    /// Binding and driver errors as for [`Statement::all`], plus
    /// [`SqlBridgeError::RowConversion`] when a row does not fit `T`.
    pub async fn all(&self, params: impl Into<Params>) -> Result<Vec<T>, SqlBridgeError> {
        let rows = self.inner.fetch(params.into(), "all").await?;
        rows.results.iter().map(materialize_row).collect()
    }

    /// First row as `T`, or `None`.
    ///
    /// # Errors
    /// Binding and driver errors as for [`Statement::one`], plus
    /// [`SqlBridgeError::RowConversion`] when the row does not fit `T`.
    pub async fn one(&self, params: impl Into<Params>) -> Result<Option<T>, SqlBridgeError> {
        let rows = self.inner.fetch(params.into(), "one").await?;
        materialize(rows.results.first())
    }

    /// The untyped statement this was built from.
    #[must_use]
    pub fn statement(&self) -> &Statement {
        &self.inner
    }
}

impl<T> Clone for TypedStatement<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedStatement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedStatement")
            .field("type", &std::any::type_name::<T>())
            .field("inner", &self.inner)
            .finish()
    }
}
