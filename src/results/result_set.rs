use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, build_column_index};
use crate::types::RowValues;

/// A result set from a database query
///
/// Column names are stored once and shared by every row, together with a name to index
/// cache built when the names are set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    column_names: Option<Arc<Vec<String>>>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names: None,
            column_index_cache: Arc::default(),
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index_cache = Arc::new(build_column_index(&column_names));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set. Ignored until column names have been set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let Some(column_names) = &self.column_names {
            self.results.push(CustomDbRow::with_cache(
                Arc::clone(column_names),
                Arc::clone(&self.column_index_cache),
                row_values,
            ));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }
}

impl IntoIterator for ResultSet {
    type Item = CustomDbRow;
    type IntoIter = std::vec::IntoIter<CustomDbRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_names_and_skip_until_named() {
        let mut set = ResultSet::with_capacity(2);
        set.add_row_values(vec![RowValues::Int(0)]);
        assert!(set.is_empty());

        set.set_column_names(Arc::new(vec!["id".into(), "name".into()]));
        set.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        set.add_row_values(vec![RowValues::Int(2), RowValues::Text("b".into())]);

        assert_eq!(set.len(), 2);
        let names = set.get_column_names().map(|n| n.as_slice().to_vec());
        assert_eq!(names, Some(vec!["id".to_string(), "name".to_string()]));
        let rows: Vec<CustomDbRow> = set.into_iter().collect();
        assert_eq!(rows[1].get("name"), Some(&RowValues::Text("b".into())));
        assert!(Arc::ptr_eq(&rows[0].column_names, &rows[1].column_names));
    }
}
