use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::types::ParamValue;

/// Key selecting a field out of a row: by column name or 0-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKey {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnKey {
    fn from(name: &str) -> Self {
        ColumnKey::Name(name.to_string())
    }
}

impl From<usize> for ColumnKey {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

/// A row from a query result.
///
/// Column names and the name→index cache are shared across all rows of one
/// result set, so rows stay cheap to clone.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across the result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<ParamValue>,
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a standalone row, building its own index cache.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<ParamValue>) -> Self {
        let cache = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name, or None if not found.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value by column name, or None if the column wasn't found.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&ParamValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column index, or None if out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&ParamValue> {
        self.values.get(index)
    }

    /// Get a value by a [`ColumnKey`].
    #[must_use]
    pub fn get_key(&self, key: &ColumnKey) -> Option<&ParamValue> {
        match key {
            ColumnKey::Name(name) => self.get(name),
            ColumnKey::Index(idx) => self.get_by_index(*idx),
        }
    }

    /// Render the row as a JSON object, one member per column.
    #[must_use]
    pub fn to_json_map(&self) -> JsonMap<String, JsonValue> {
        let mut map = JsonMap::with_capacity(self.column_names.len());
        for (name, value) in self.column_names.iter().zip(&self.values) {
            map.insert(name.clone(), value.to_json());
        }
        map
    }
}
