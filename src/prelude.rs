//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::error::SessionError;
pub use crate::results::{ColumnKey, ResultSet, Row};
pub use crate::rewrite::{RewrittenQuery, rewrite};
pub use crate::session::{
    CachePolicy, RegisteredValue, RewriteMode, Session, StatementOptions, build_in_string,
};
pub use crate::statement::{BoundParam, Statement};
pub use crate::types::{
    BindArg, Bound, FetchMode, NullPolicy, ParamKey, ParamType, ParamValue,
};
pub use crate::{ConnectionCollection, ConnectionHolder, SessionConfig};
