use tracing::trace;

use crate::connection::Connection;
use crate::error::SqlBridgeError;
use crate::params::{FieldMap, Params};
use crate::results::ChangeResult;
use crate::schema::{Table, TableDef};

/// Which properties a typed write binds.
///
/// ```rust
/// use sql_bridge::prelude::*;
///
/// let options = MutationOptions::default().with_only_props(["email"]);
/// assert!(options.filters_props());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOptions {
    /// Explicit property list.
    pub only_props: Option<Vec<String>>,
    /// Without an explicit list, keep only properties whose value is not `NULL`.
    pub only_with_values: bool,
}

impl MutationOptions {
    #[must_use]
    pub fn with_only_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_props = Some(props.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_only_values(mut self) -> Self {
        self.only_with_values = true;
        self
    }

    #[must_use]
    pub fn filters_props(&self) -> bool {
        self.only_props.is_some() || self.only_with_values
    }

    fn requested(&self, table: &TableDef, fields: &FieldMap) -> Vec<String> {
        if let Some(props) = &self.only_props {
            return unique(props.iter().cloned());
        }
        let declared = table.property_names();
        if self.only_with_values {
            declared
                .into_iter()
                .filter(|p| fields.get(p).is_some_and(|v| !v.is_null()))
                .collect()
        } else {
            declared
        }
    }
}

fn unique(props: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for prop in props {
        if !out.contains(&prop) {
            out.push(prop);
        }
    }
    out
}

/// Subset of `fields` named by `props`. Absent properties are left out so the binder reports
/// them as missing.
fn restrict(fields: &FieldMap, props: &[String]) -> Params {
    Params::Named(
        props
            .iter()
            .filter_map(|p| fields.get(p).map(|v| (p.clone(), v.clone())))
            .collect(),
    )
}

impl Connection {
    /// Insert one row. `None` returns a zero result without touching the driver.
    ///
    /// # Errors
    /// Serialization, schema, binding or driver errors.
    pub async fn insert<'r, T: Table + Sync + 'r>(
        &self,
        row: impl Into<Option<&'r T>>,
        options: &MutationOptions,
    ) -> Result<ChangeResult, SqlBridgeError> {
        let Some(row) = row.into() else {
            return Ok(ChangeResult::default());
        };
        let table = T::table_def();
        let fields = row.to_field_map()?;
        let props = options.requested(&table, &fields);
        trace!(table = %table.name, ?props, "insert");
        let sql = self.schema.insert(&table, &props)?;
        self.prepare(sql, ()).exec(restrict(&fields, &props)).await
    }

    /// Insert rows in order, stopping at the first failure.
    ///
    /// With property filtering each row gets its own INSERT; otherwise one statement is
    /// prepared and executed per row. Changes are summed and the last rowid kept.
    ///
    /// # Errors
    /// The first serialization, schema, binding or driver error.
    pub async fn insert_all<T: Table + Sync>(
        &self,
        rows: &[T],
        options: &MutationOptions,
    ) -> Result<ChangeResult, SqlBridgeError> {
        let mut total = ChangeResult::default();
        if rows.is_empty() {
            return Ok(total);
        }
        if options.filters_props() {
            for row in rows {
                total.accumulate(self.insert(row, options).await?);
            }
            return Ok(total);
        }

        let table = T::table_def();
        let props = table.property_names();
        trace!(table = %table.name, rows = rows.len(), "insert batch");
        let stmt = self.prepare(self.schema.insert(&table, &props)?, ());
        for row in rows {
            let fields = row.to_field_map()?;
            total.accumulate(stmt.exec(restrict(&fields, &props)).await?);
        }
        Ok(total)
    }

    /// Update one row by primary key. Key properties are always bound, even when
    /// `only_props` leaves them out.
    ///
    /// # Errors
    /// Serialization, schema, binding or driver errors.
    pub async fn update<'r, T: Table + Sync + 'r>(
        &self,
        row: impl Into<Option<&'r T>>,
        options: &MutationOptions,
    ) -> Result<ChangeResult, SqlBridgeError> {
        let Some(row) = row.into() else {
            return Ok(ChangeResult::default());
        };
        let table = T::table_def();
        let fields = row.to_field_map()?;
        let props = unique(
            options
                .requested(&table, &fields)
                .into_iter()
                .chain(table.primary_keys()),
        );
        trace!(table = %table.name, ?props, "update");
        let sql = self.schema.update(&table, &props)?;
        self.prepare(sql, ()).exec(restrict(&fields, &props)).await
    }

    /// Delete one row by primary key. Only key properties are bound; `options` has no effect.
    ///
    /// # Errors
    /// Serialization, schema, binding or driver errors.
    pub async fn delete<'r, T: Table + Sync + 'r>(
        &self,
        row: impl Into<Option<&'r T>>,
        _options: &MutationOptions,
    ) -> Result<ChangeResult, SqlBridgeError> {
        let Some(row) = row.into() else {
            return Ok(ChangeResult::default());
        };
        let table = T::table_def();
        let fields = row.to_field_map()?;
        let props = table.primary_keys();
        trace!(table = %table.name, ?props, "delete");
        let sql = self.schema.delete(&table)?;
        self.prepare(sql, ()).exec(restrict(&fields, &props)).await
    }
}
