use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use std::fmt;

/// Values that can be bound to a statement or read back from a row.
///
/// One enum across the whole crate so binding, the parameter registry, and
/// result rows all speak the same type:
/// ```rust
/// use sql_session::prelude::*;
///
/// let params = vec![
///     ParamValue::Int(1),
///     ParamValue::Text("alice".into()),
///     ParamValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl ParamValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let ParamValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let ParamValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let ParamValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let ParamValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let ParamValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let ParamValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render this value the way it would be bound as text.
    ///
    /// Timestamps use the same `%F %T%.f` shape the driver conversion uses,
    /// so text renderings round-trip through [`as_timestamp`](Self::as_timestamp).
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Text(s) => s.clone(),
            ParamValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            ParamValue::Timestamp(dt) => dt.format("%F %T%.f").to_string(),
            ParamValue::Null => String::new(),
            ParamValue::Json(j) => j.to_string(),
            ParamValue::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Convert to a JSON value for the keyed fetch tree.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            ParamValue::Int(i) => JsonValue::from(*i),
            ParamValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            ParamValue::Text(s) => JsonValue::String(s.clone()),
            ParamValue::Bool(b) => JsonValue::Bool(*b),
            ParamValue::Timestamp(dt) => JsonValue::String(dt.format("%F %T%.f").to_string()),
            ParamValue::Null => JsonValue::Null,
            ParamValue::Json(j) => j.clone(),
            ParamValue::Blob(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Declared bind type, driving null-policy coercion on
/// [`Statement::bind_value`](crate::Statement::bind_value).
///
/// Only `Int` and `Str` carry coercion rules; the remaining types bind their
/// value unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    /// NULL
    Null,
    /// Integer
    Int,
    /// Text (the default, as in the classic bind APIs)
    #[default]
    Str,
    /// Boolean
    Bool,
    /// Large object / blob
    Lob,
}

impl ParamType {
    /// Best-effort declared type for a value bound without one
    /// (the `execute_with` path). Diagnostics only.
    #[must_use]
    pub fn for_value(value: &ParamValue) -> Self {
        match value {
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::Null => ParamType::Null,
            ParamValue::Blob(_) => ParamType::Lob,
            _ => ParamType::Str,
        }
    }
}

/// How NULL and "empty" values are reconciled at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Bind the value as given.
    #[default]
    None,
    /// Coerce "empty" values (zero integers, empty strings) to NULL.
    Force,
    /// Coerce NULL to a type-appropriate empty value (`0`, `""`).
    Disallow,
}

/// Identity of a placeholder: named (`:name`) or positional (1-based `?N`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Name(String),
    Position(usize),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Name(name) => write!(f, ":{name}"),
            ParamKey::Position(idx) => write!(f, "?{idx}"),
        }
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.strip_prefix(':').unwrap_or(name).to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::from(name.as_str())
    }
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

/// A bind argument: one scalar, or a sequence to fan out across the numbered
/// variants of a repeated placeholder.
///
/// A closed union instead of runtime type inspection, so multiplicity
/// resolution is explicit at the API boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum BindArg {
    Scalar(ParamValue),
    Sequence(Vec<ParamValue>),
}

impl From<ParamValue> for BindArg {
    fn from(value: ParamValue) -> Self {
        BindArg::Scalar(value)
    }
}

impl From<Vec<ParamValue>> for BindArg {
    fn from(values: Vec<ParamValue>) -> Self {
        BindArg::Sequence(values)
    }
}

impl From<&[ParamValue]> for BindArg {
    fn from(values: &[ParamValue]) -> Self {
        BindArg::Sequence(values.to_vec())
    }
}

/// Result of a bind call: a single placeholder bound, or the final loop
/// counter after a sequence/multiplicity fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Single,
    Expanded(usize),
}

/// Row-shaping mode for one-shot queries.
///
/// `Assoc`, `Num`, and `Both` are the safe modes accepted by
/// [`Session::run`](crate::Session::run); the rest are rejected up front
/// before any SQL reaches the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Rows addressable by column name.
    Assoc,
    /// Rows addressable by column index.
    Num,
    /// Rows addressable both ways.
    Both,
    /// Single-column fetch (not supported by `run`).
    Column,
    /// Key/value pair fetch (not supported by `run`).
    KeyPair,
}
