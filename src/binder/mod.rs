//! Named-to-positional parameter binding.
//!
//! A statement is scanned once by [`Binder::new`]; each call then resolves a fresh
//! [`Params`] source against the scan with [`Binder::bind`], producing a [`QueryDescriptor`]
//! whose SQL carries exactly one positional placeholder per bound value.

use std::fmt::Write;
use std::sync::Arc;

use clap::ValueEnum;
use serde::Deserialize;

mod parsers;
mod scanner;

pub(crate) use parsers::line_break_len;
pub(crate) use scanner::Scanner;

use parsers::{is_identifier_start, scan_digits, scan_identifier};

use crate::error::SqlBridgeError;
use crate::params::Params;
use crate::types::RowValues;

/// Positional placeholder emitted for each named token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// Anonymous `?` markers (SQLite, MySQL).
    #[default]
    Sqlite,
    /// Numbered `$1`, `$2`, ... markers.
    Postgres,
}

impl PlaceholderStyle {
    fn write_placeholder(self, out: &mut String, position: usize) {
        match self {
            PlaceholderStyle::Sqlite => out.push('?'),
            PlaceholderStyle::Postgres => {
                // Writing to a String cannot fail.
                let _ = write!(out, "${position}");
            }
        }
    }
}

/// A statement after binding: positional SQL plus the values to send with it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    original_sql: Arc<str>,
    original_params: Params,
    sql: Arc<str>,
    values: Vec<RowValues>,
    param_names: Option<Arc<[String]>>,
}

impl QueryDescriptor {
    /// SQL as written by the caller.
    #[must_use]
    pub fn original_sql(&self) -> &str {
        &self.original_sql
    }

    #[must_use]
    pub fn original_params(&self) -> &Params {
        &self.original_params
    }

    /// SQL with named tokens replaced by positional placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values in placeholder order.
    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    /// Token names in placeholder order; `None` for positional statements.
    #[must_use]
    pub fn param_names(&self) -> Option<&[String]> {
        self.param_names.as_deref()
    }

    #[must_use]
    pub fn into_parts(self) -> (Arc<str>, Vec<RowValues>) {
        (self.sql, self.values)
    }
}

/// The one-time scan of a SQL template.
#[derive(Debug, Clone)]
pub struct Binder {
    original_sql: Arc<str>,
    sql: Arc<str>,
    names: Option<Arc<[String]>>,
    slots: usize,
}

impl Binder {
    /// Scan `sql` for `$identifier` tokens and positional markers.
    ///
    /// Named tokens take precedence: if at least one is present the statement is named, and
    /// every occurrence (repeats included) becomes its own positional slot.
    #[must_use]
    pub fn new(sql: &str, style: PlaceholderStyle) -> Self {
        let mut scanner = Scanner::new(sql);
        let bytes = scanner.bytes();
        let mut names: Vec<String> = Vec::new();
        let mut normalized = String::with_capacity(sql.len());
        let mut copied_to = 0;
        let mut bare: usize = 0;
        let mut highest_numbered: usize = 0;

        while let Some(idx) = scanner.next_code() {
            match bytes[idx] {
                b'$' => {
                    if let Some(end) = scan_identifier(bytes, idx + 1) {
                        normalized.push_str(&sql[copied_to..idx]);
                        names.push(sql[idx + 1..end].to_string());
                        style.write_placeholder(&mut normalized, names.len());
                        copied_to = end;
                        scanner.skip_to(end);
                    } else if let Some((end, digits)) = scan_digits(bytes, idx + 1) {
                        highest_numbered =
                            highest_numbered.max(digits.parse::<usize>().unwrap_or(0));
                        scanner.skip_to(end);
                    }
                }
                b'?' => {
                    if let Some((end, digits)) = scan_digits(bytes, idx + 1) {
                        highest_numbered =
                            highest_numbered.max(digits.parse::<usize>().unwrap_or(0));
                        scanner.skip_to(end);
                    } else {
                        bare += 1;
                    }
                }
                _ => {}
            }
        }

        let original_sql: Arc<str> = Arc::from(sql);
        if names.is_empty() {
            return Self {
                sql: Arc::clone(&original_sql),
                original_sql,
                names: None,
                slots: bare.max(highest_numbered),
            };
        }

        normalized.push_str(&sql[copied_to..]);
        Self {
            original_sql,
            sql: Arc::from(normalized),
            slots: names.len(),
            names: Some(names.into()),
        }
    }

    #[must_use]
    pub fn original_sql(&self) -> &str {
        &self.original_sql
    }

    /// Normalized SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn is_named(&self) -> bool {
        self.names.is_some()
    }

    /// Number of positional slots the normalized SQL expects.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Resolve a parameter source against this statement.
    ///
    /// # Errors
    /// Returns [`SqlBridgeError::MissingParameter`] when a named mapping lacks a referenced
    /// token, and [`SqlBridgeError::InvalidParameterShape`] when the source shape does not fit
    /// the statement. Both are raised before anything reaches the driver.
    pub fn bind(&self, params: Params) -> Result<QueryDescriptor, SqlBridgeError> {
        let values = match &self.names {
            Some(names) => self.bind_named(names, &params)?,
            None => self.bind_positional(&params)?,
        };
        Ok(QueryDescriptor {
            original_sql: Arc::clone(&self.original_sql),
            original_params: params,
            sql: Arc::clone(&self.sql),
            values,
            param_names: self.names.clone(),
        })
    }

    fn bind_named(
        &self,
        names: &[String],
        params: &Params,
    ) -> Result<Vec<RowValues>, SqlBridgeError> {
        if params.is_empty() {
            return Ok(vec![RowValues::Null; names.len()]);
        }
        let Params::Named(map) = params else {
            return Err(self.shape_error("a named mapping"));
        };
        names
            .iter()
            .map(|name| {
                map.get(name)
                    .cloned()
                    .ok_or_else(|| SqlBridgeError::MissingParameter {
                        name: name.clone(),
                        sql: self.original_sql.to_string(),
                        params: params.to_string(),
                    })
            })
            .collect()
    }

    fn bind_positional(&self, params: &Params) -> Result<Vec<RowValues>, SqlBridgeError> {
        match params {
            Params::Positional(values) => Ok(values.clone()),
            Params::Scalar(value) => match self.slots {
                0 => Ok(Vec::new()),
                1 => Ok(vec![value.clone()]),
                n => Err(self.shape_error(&format!("a sequence of {n} values"))),
            },
            Params::Named(map) if map.is_empty() && self.slots == 0 => Ok(Vec::new()),
            Params::Named(_) => Err(self.shape_error("a positional sequence")),
            Params::None if self.slots == 0 => Ok(Vec::new()),
            Params::None => Err(self.shape_error(&format!("a sequence of {} values", self.slots))),
        }
    }

    fn shape_error(&self, expected: &str) -> SqlBridgeError {
        SqlBridgeError::InvalidParameterShape {
            expected: expected.to_string(),
            sql: self.original_sql.to_string(),
        }
    }
}

/// Scan and bind in one step.
///
/// ```rust
/// use sql_bridge::prelude::*;
///
/// let q = normalize(
///     "SELECT * FROM contact WHERE name = $name OR nick = $name",
///     Params::named([("name", "jane")]),
///     PlaceholderStyle::Sqlite,
/// )?;
/// assert_eq!(q.sql(), "SELECT * FROM contact WHERE name = ? OR nick = ?");
/// assert_eq!(q.values().len(), 2);
/// # Ok::<(), SqlBridgeError>(())
/// ```
///
/// # Errors
/// See [`Binder::bind`].
pub fn normalize(
    sql: &str,
    params: impl Into<Params>,
    style: PlaceholderStyle,
) -> Result<QueryDescriptor, SqlBridgeError> {
    Binder::new(sql, style).bind(params.into())
}

/// Leading verb of a statement, uppercased, looking past comments and a `WITH` prelude.
///
/// `WITH x AS (SELECT ...) INSERT INTO ...` yields `INSERT`.
pub(crate) fn statement_keyword(sql: &str) -> Option<String> {
    let mut scanner = Scanner::new(sql);
    let bytes = scanner.bytes();
    let mut depth = 0usize;
    let mut in_with = false;

    while let Some(idx) = scanner.next_code() {
        match bytes[idx] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b if is_identifier_start(b) => {
                let end = scan_identifier(bytes, idx).unwrap_or(idx + 1);
                scanner.skip_to(end);
                if depth > 0 {
                    continue;
                }
                let word = sql[idx..end].to_ascii_uppercase();
                if !in_with {
                    if word == "WITH" {
                        in_with = true;
                        continue;
                    }
                    return Some(word);
                }
                if matches!(
                    word.as_str(),
                    "SELECT" | "INSERT" | "REPLACE" | "UPDATE" | "DELETE" | "VALUES"
                ) {
                    return Some(word);
                }
            }
            _ => {}
        }
    }
    None
}
