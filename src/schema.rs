//! Table metadata and the SQL generated from it.
//!
//! Row types describe themselves with a [`TableDef`] and serialize through serde; a
//! [`SchemaGenerator`] turns that description into INSERT/UPDATE/DELETE/DDL text that uses
//! `$property` named tokens, which the binder later makes positional.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::SqlBridgeError;
use crate::params::FieldMap;
use crate::types::RowValues;

/// One declared property of a row type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Field name in the serialized row.
    pub property: String,
    /// Column name in the database.
    pub column: String,
    pub data_type: String,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
}

impl ColumnDef {
    #[must_use]
    pub fn new(property: impl Into<String>, data_type: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            column: property.clone(),
            property,
            data_type: data_type.into(),
            primary_key: false,
            auto_increment: false,
            nullable: true,
        }
    }

    #[must_use]
    pub fn column_name(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Reflection-style description of a row type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Every declared property, in declaration order.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.property.clone()).collect()
    }

    #[must_use]
    pub fn primary_keys(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.property.clone())
            .collect()
    }

    #[must_use]
    pub fn find(&self, property: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.property == property)
    }

    fn resolve<'a>(&'a self, props: &[String]) -> Result<Vec<&'a ColumnDef>, SqlBridgeError> {
        props
            .iter()
            .map(|p| {
                self.find(p).ok_or_else(|| {
                    SqlBridgeError::SchemaError(format!(
                        "table `{}` has no property `{p}`",
                        self.name
                    ))
                })
            })
            .collect()
    }
}

/// A row type the mutation helpers can write.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use sql_bridge::prelude::*;
///
/// #[derive(Serialize, Deserialize)]
/// struct Contact {
///     id: Option<i64>,
///     name: String,
///     email: String,
/// }
///
/// impl Table for Contact {
///     fn table_def() -> TableDef {
///         TableDef::new("contact")
///             .column(ColumnDef::new("id", "INTEGER").primary_key().auto_increment())
///             .column(ColumnDef::new("name", "TEXT").not_null())
///             .column(ColumnDef::new("email", "TEXT").not_null())
///     }
/// }
///
/// let row = Contact { id: None, name: "Jane".into(), email: "jane@mail.org".into() };
/// let fields = row.to_field_map()?;
/// assert_eq!(fields["name"], RowValues::Text("Jane".into()));
/// assert!(fields["id"].is_null());
/// # Ok::<(), SqlBridgeError>(())
/// ```
pub trait Table: Serialize {
    fn table_def() -> TableDef;

    /// Serialize the row into property/value pairs.
    ///
    /// # Errors
    /// Returns [`SqlBridgeError::RowConversion`] if serialization fails, and
    /// [`SqlBridgeError::SchemaError`] if the row does not serialize to a struct-like map.
    fn to_field_map(&self) -> Result<FieldMap, SqlBridgeError> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, RowValues::from_json(v)))
                .collect()),
            other => Err(SqlBridgeError::SchemaError(format!(
                "row for `{}` serialized to {other}, expected an object",
                Self::table_def().name
            ))),
        }
    }
}

/// Produces the SQL the connection runs for typed helpers.
pub trait SchemaGenerator: std::fmt::Debug + Send + Sync {
    /// INSERT binding the given properties as `$property` tokens.
    ///
    /// # Errors
    /// `SchemaError` for unknown properties or an empty property list.
    fn insert(&self, table: &TableDef, props: &[String]) -> Result<String, SqlBridgeError>;

    /// UPDATE setting the non-key properties among `props`, keyed by the primary key.
    ///
    /// # Errors
    /// `SchemaError` when the table has no primary key or nothing is left to set.
    fn update(&self, table: &TableDef, props: &[String]) -> Result<String, SqlBridgeError>;

    /// DELETE keyed by the primary key.
    ///
    /// # Errors
    /// `SchemaError` when the table has no primary key.
    fn delete(&self, table: &TableDef) -> Result<String, SqlBridgeError>;

    /// # Errors
    /// `SchemaError` when the table declares no columns.
    fn create_table(&self, table: &TableDef) -> Result<String, SqlBridgeError>;

    fn drop_table(&self, table: &TableDef) -> String;

    /// Query returning one table name per row.
    fn list_tables(&self) -> String;
}

/// SQLite flavour of [`SchemaGenerator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSchema;

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn key_clause(table: &TableDef) -> Result<String, SqlBridgeError> {
    let keys: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| format!("{} = ${}", quote_ident(&c.column), c.property))
        .collect();
    if keys.is_empty() {
        return Err(SqlBridgeError::SchemaError(format!(
            "table `{}` has no primary key",
            table.name
        )));
    }
    Ok(keys.join(" AND "))
}

impl SchemaGenerator for SqliteSchema {
    fn insert(&self, table: &TableDef, props: &[String]) -> Result<String, SqlBridgeError> {
        if props.is_empty() {
            return Err(SqlBridgeError::SchemaError(format!(
                "nothing to insert into `{}`",
                table.name
            )));
        }
        let columns = table.resolve(props)?;
        let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.column)).collect();
        let tokens: Vec<String> = columns.iter().map(|c| format!("${}", c.property)).collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&table.name),
            names.join(", "),
            tokens.join(", ")
        ))
    }

    fn update(&self, table: &TableDef, props: &[String]) -> Result<String, SqlBridgeError> {
        let where_clause = key_clause(table)?;
        let sets: Vec<String> = table
            .resolve(props)?
            .into_iter()
            .filter(|c| !c.primary_key)
            .map(|c| format!("{} = ${}", quote_ident(&c.column), c.property))
            .collect();
        if sets.is_empty() {
            return Err(SqlBridgeError::SchemaError(format!(
                "nothing to update in `{}`",
                table.name
            )));
        }
        Ok(format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(&table.name),
            sets.join(", "),
            where_clause
        ))
    }

    fn delete(&self, table: &TableDef) -> Result<String, SqlBridgeError> {
        Ok(format!(
            "DELETE FROM {} WHERE {}",
            quote_ident(&table.name),
            key_clause(table)?
        ))
    }

    fn create_table(&self, table: &TableDef) -> Result<String, SqlBridgeError> {
        if table.columns.is_empty() {
            return Err(SqlBridgeError::SchemaError(format!(
                "table `{}` declares no columns",
                table.name
            )));
        }
        let keys: Vec<&ColumnDef> = table.columns.iter().filter(|c| c.primary_key).collect();
        let inline_key = keys.len() == 1;
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", quote_ident(&c.column), c.data_type);
                if c.primary_key && inline_key {
                    def.push_str(" PRIMARY KEY");
                    if c.auto_increment {
                        def.push_str(" AUTOINCREMENT");
                    }
                } else if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        if keys.len() > 1 {
            let names: Vec<String> = keys.iter().map(|c| quote_ident(&c.column)).collect();
            defs.push(format!("PRIMARY KEY ({})", names.join(", ")));
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            quote_ident(&table.name),
            defs.join(",\n  ")
        ))
    }

    fn drop_table(&self, table: &TableDef) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(&table.name))
    }

    fn list_tables(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> TableDef {
        TableDef::new("contact")
            .column(ColumnDef::new("id", "INTEGER").primary_key().auto_increment())
            .column(ColumnDef::new("name", "TEXT").not_null())
            .column(ColumnDef::new("email", "TEXT").column_name("email_address"))
    }

    fn props(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn insert_uses_column_names_and_property_tokens() {
        let sql = SqliteSchema
            .insert(&contact(), &props(&["name", "email"]))
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"contact\" (\"name\", \"email_address\") VALUES ($name, $email)"
        );
    }

    #[test]
    fn update_keys_on_primary_key() {
        let sql = SqliteSchema
            .update(&contact(), &props(&["email", "id"]))
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE \"contact\" SET \"email_address\" = $email WHERE \"id\" = $id"
        );
    }

    #[test]
    fn update_without_settable_columns_fails() {
        let err = SqliteSchema.update(&contact(), &props(&["id"])).unwrap_err();
        assert!(matches!(err, SqlBridgeError::SchemaError(_)));
    }

    #[test]
    fn unknown_property_is_rejected() {
        let err = SqliteSchema
            .insert(&contact(), &props(&["nickname"]))
            .unwrap_err();
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn delete_needs_a_key() {
        assert_eq!(
            SqliteSchema.delete(&contact()).unwrap(),
            "DELETE FROM \"contact\" WHERE \"id\" = $id"
        );
        let keyless = TableDef::new("log").column(ColumnDef::new("msg", "TEXT"));
        assert!(SqliteSchema.delete(&keyless).is_err());
    }

    #[test]
    fn create_table_inline_and_composite_keys() {
        let sql = SqliteSchema.create_table(&contact()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"contact\" (\n  \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n  \"name\" TEXT NOT NULL,\n  \"email_address\" TEXT\n)"
        );

        let link = TableDef::new("link")
            .column(ColumnDef::new("a", "INTEGER").primary_key())
            .column(ColumnDef::new("b", "INTEGER").primary_key());
        let sql = SqliteSchema.create_table(&link).unwrap();
        assert!(sql.ends_with("PRIMARY KEY (\"a\", \"b\")\n)"));
        assert!(sql.contains("\"a\" INTEGER NOT NULL"));
    }
}
