//! A transactional SQL-execution layer over `rusqlite`.
//!
//! One [`Session`] wraps one native connection and adds what the raw driver
//! does not have: logical transaction nesting via savepoints, reuse of
//! already-prepared statements, rewriting of repeated named placeholders,
//! null-policy value coercion, array fan-out binding, and keyed result
//! shaping.

mod collection;
mod config;
mod convert;
mod error;
pub mod rewrite;
mod results;
mod session;
mod statement;
mod types;

pub mod prelude;

pub use collection::{ConnectionCollection, ConnectionHolder};
pub use config::SessionConfig;
pub use convert::{extract_value, param_value_to_sqlite};
pub use error::SessionError;
pub use results::{ColumnKey, ResultSet, Row};
pub use session::{
    CachePolicy, RegisteredValue, RewriteMode, Session, StatementOptions, build_in_string,
};
pub use statement::{BoundParam, Statement};
pub use types::{BindArg, Bound, FetchMode, NullPolicy, ParamKey, ParamType, ParamValue};
