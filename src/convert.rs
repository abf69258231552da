//! Conversions between [`ParamValue`] and the native driver's value type,
//! plus row materialization.

use rusqlite::types::Value;
use std::sync::Arc;

use crate::error::SessionError;
use crate::results::ResultSet;
use crate::types::ParamValue;

/// Convert a single [`ParamValue`] to a native `SQLite` value.
#[must_use]
pub fn param_value_to_sqlite(value: &ParamValue) -> Value {
    match value {
        ParamValue::Int(i) => Value::Integer(*i),
        ParamValue::Float(f) => Value::Real(*f),
        ParamValue::Text(s) => Value::Text(s.clone()),
        ParamValue::Bool(b) => Value::Integer(i64::from(*b)),
        ParamValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        ParamValue::Null => Value::Null,
        ParamValue::Json(jval) => Value::Text(jval.to_string()),
        ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Extract a [`ParamValue`] from a native `SQLite` row.
///
/// # Errors
/// Returns [`SessionError::Sqlite`] if the value cannot be read.
pub fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<ParamValue, SessionError> {
    let value: Value = row.get(idx).map_err(SessionError::Sqlite)?;
    Ok(match value {
        Value::Null => ParamValue::Null,
        Value::Integer(i) => ParamValue::Int(i),
        Value::Real(f) => ParamValue::Float(f),
        Value::Text(s) => ParamValue::Text(s),
        Value::Blob(b) => ParamValue::Blob(b),
    })
}

/// Materialize all rows of an already-bound native statement into a
/// [`ResultSet`].
///
/// # Errors
/// Returns [`SessionError`] if stepping the statement or reading a value
/// fails.
pub(crate) fn build_result_set(
    stmt: &mut rusqlite::Statement<'_>,
) -> Result<ResultSet, SessionError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.raw_query();
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
