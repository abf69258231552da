//! Result-shaping helpers over the materialized rows of an executed
//! statement.

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::warn;

use crate::results::{ColumnKey, Row};
use crate::session::lock;
use crate::types::ParamValue;

use super::Statement;

impl Statement {
    /// Fetch the next row, advancing the cursor.
    ///
    /// Fetching from a statement that is not SELECT/SHOW logs a warning but
    /// still delegates; it simply yields no rows.
    #[must_use]
    pub fn fetch(&self) -> Option<Row> {
        if !self.inner.fetch_friendly {
            warn!(query = %self.inner.sql, "attempted fetch on non-select/show query");
        }
        let mut state = lock(&self.inner.state);
        let row = state.rows.results.get(state.cursor).cloned();
        if row.is_some() {
            state.cursor += 1;
        }
        row
    }

    /// Fetch one row and return a single field of it: the first field, or
    /// the one selected by `key`. `None` if no row remains or the field is
    /// absent.
    #[must_use]
    pub fn fetch_column_value(&self, key: Option<ColumnKey>) -> Option<ParamValue> {
        let row = self.fetch()?;
        match key {
            None => row.get_by_index(0).cloned(),
            Some(key) => row.get_key(&key).cloned(),
        }
    }

    /// Collect one field per remaining row into a vector, appending to the
    /// optional `seed`. Missing fields collect as [`ParamValue::Null`].
    #[must_use]
    pub fn fetch_column_all(
        &self,
        key: Option<ColumnKey>,
        seed: Option<Vec<ParamValue>>,
    ) -> Vec<ParamValue> {
        let mut output = seed.unwrap_or_default();
        while let Some(row) = self.fetch() {
            let value = match &key {
                None => row.get_by_index(0).cloned(),
                Some(key) => row.get_key(key).cloned(),
            };
            output.push(value.unwrap_or(ParamValue::Null));
        }
        output
    }

    /// Build a nested mapping of all remaining rows keyed by the values of
    /// `key_fields`, one tree level per field.
    ///
    /// At the leaf: the whole row (minus the key fields when `remove_key`),
    /// or only `value_field` when given. With `as_array` each leaf is an
    /// array that rows append to; otherwise later rows overwrite earlier
    /// ones.
    #[must_use]
    pub fn fetch_all_keyed(
        &self,
        key_fields: &[&str],
        remove_key: bool,
        as_array: bool,
        value_field: Option<&str>,
    ) -> JsonValue {
        let mut tree = JsonMap::new();
        while let Some(row) = self.fetch() {
            let mut record = row.to_json_map();
            let mut path = Vec::with_capacity(key_fields.len());
            for field in key_fields {
                let key_value = row
                    .get(field)
                    .map_or(JsonValue::Null, ParamValue::to_json);
                path.push(json_key(&key_value));
                if remove_key {
                    record.remove(*field);
                }
            }
            let leaf = match value_field {
                Some(field) => record.get(field).cloned().unwrap_or(JsonValue::Null),
                None => JsonValue::Object(record),
            };
            insert_keyed(&mut tree, &path, leaf, as_array);
        }
        JsonValue::Object(tree)
    }
}

fn json_key(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Insert `leaf` into `tree` at `path`, creating intermediate objects.
/// `append` collects leaves into arrays instead of overwriting.
fn insert_keyed(tree: &mut JsonMap<String, JsonValue>, path: &[String], leaf: JsonValue, append: bool) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        if append {
            match tree.get_mut(head) {
                Some(JsonValue::Array(items)) => items.push(leaf),
                _ => {
                    tree.insert(head.clone(), JsonValue::Array(vec![leaf]));
                }
            }
        } else {
            tree.insert(head.clone(), leaf);
        }
        return;
    }
    let entry = tree
        .entry(head.clone())
        .or_insert_with(|| JsonValue::Object(JsonMap::new()));
    if !entry.is_object() {
        *entry = JsonValue::Object(JsonMap::new());
    }
    if let JsonValue::Object(children) = entry {
        insert_keyed(children, rest, leaf, append);
    }
}
