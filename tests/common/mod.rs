#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sql_bridge::prelude::*;

/// A recorded driver call: normalized SQL and the values bound to it.
pub type Call = (String, Vec<RowValues>);

/// In-memory [`NativeDriver`] that records every call and replays canned results.
#[derive(Debug, Default)]
pub struct StubDriver {
    style: PlaceholderStyle,
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<ResultSet>>,
    change: ChangeResult,
    fail_at: Option<usize>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: PlaceholderStyle) -> Self {
        self.style = style;
        self
    }

    /// Queue one result set for the next `query` call.
    pub fn with_rows(self, columns: &[&str], rows: Vec<Vec<RowValues>>) -> Self {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(columns.iter().map(ToString::to_string).collect()));
        for row in rows {
            rs.add_row_values(row);
        }
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(rs);
        self
    }

    pub fn with_change(mut self, change: ChangeResult) -> Self {
        self.change = change;
        self
    }

    /// Fail the call with this zero-based index.
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    fn record(&self, sql: &str, params: &[RowValues]) -> Result<(), SqlBridgeError> {
        let mut calls = self.calls.lock().expect("calls lock");
        let index = calls.len();
        calls.push((sql.to_string(), params.to_vec()));
        if self.fail_at == Some(index) {
            return Err(SqlBridgeError::ExecutionError(format!(
                "stub failure on call {index}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NativeDriver for StubDriver {
    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlBridgeError> {
        self.record(sql, params)?;
        Ok(self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_default())
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ChangeResult, SqlBridgeError> {
        self.record(sql, params)?;
        Ok(self.change)
    }

    async fn close(&self) -> Result<(), SqlBridgeError> {
        Ok(())
    }
}

/// Connection over a shared stub so tests can inspect the calls afterwards.
pub fn stub_connection(driver: StubDriver) -> (Connection, Arc<StubDriver>) {
    let driver = Arc::new(driver);
    (Connection::from_driver(driver.clone()), driver)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
}

impl Contact {
    pub fn new(id: Option<i64>, name: &str, email: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

impl Table for Contact {
    fn table_def() -> TableDef {
        TableDef::new("contact")
            .column(
                ColumnDef::new("id", "INTEGER")
                    .primary_key()
                    .auto_increment(),
            )
            .column(ColumnDef::new("name", "TEXT").not_null())
            .column(ColumnDef::new("email", "TEXT").not_null())
    }
}
