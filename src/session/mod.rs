//! The extended connection: execution engine, transaction depth controller,
//! statement cache, and cross-statement parameter registry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tracing::{error, warn};

use crate::convert::build_result_set;
use crate::error::SessionError;
use crate::results::ResultSet;
use crate::types::{FetchMode, NullPolicy, ParamKey, ParamType, ParamValue};

mod cache;
mod registry;
mod tx;

pub use cache::{CachePolicy, RewriteMode, StatementOptions};
pub use registry::RegisteredValue;

use cache::StatementCache;
use registry::ParamRegistry;

/// Lock a mutex, recovering from poisoning (a panicked holder leaves the
/// data usable for this crate's state).
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One logical database connection: the native handle plus transaction
/// depth, sticky error flag, statement cache, and parameter registry.
///
/// `Session` is a cheap-clone handle; clones share all state. Calls are
/// synchronous and complete (success or failure) before returning. The
/// transaction protocol is inherently sequential per connection — issue
/// transaction calls from one logical owner at a time.
///
/// ```no_run
/// use sql_session::prelude::*;
///
/// # fn demo() -> Result<(), SessionError> {
/// let session = SessionConfig::new("app.db").connect()?;
/// session.begin()?;
/// session.exec("INSERT INTO t (a) VALUES (1)")?;
/// session.commit()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) conn: Mutex<Connection>,
    pub(crate) depth: Mutex<u32>,
    pub(crate) has_error: AtomicBool,
    pub(crate) registry: Mutex<ParamRegistry>,
    pub(crate) cache: Mutex<StatementCache>,
}

impl SessionInner {
    pub(crate) fn note_error(&self) {
        self.has_error.store(true, Ordering::SeqCst);
    }
}

impl Session {
    /// Wrap an already-open native connection.
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                conn: Mutex::new(conn),
                depth: Mutex::new(0),
                has_error: AtomicBool::new(false),
                registry: Mutex::new(ParamRegistry::new()),
                cache: Mutex::new(StatementCache::new()),
            }),
        }
    }

    /// Whether any statement on this session has failed since the last
    /// rollback. Sticky: a failure anywhere inside a transaction forces the
    /// outermost [`commit`](Self::commit) to roll back.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.inner.has_error.load(Ordering::SeqCst)
    }

    /// Raise the error flag manually, forcing the open transaction toward
    /// rollback at commit time.
    pub fn mark_error(&self) {
        self.inner.note_error();
    }

    /// Lower the error flag.
    pub fn clear_error(&self) {
        self.inner.has_error.store(false, Ordering::SeqCst);
    }

    /// Execute a non-prepared statement, returning the affected row count.
    ///
    /// # Errors
    /// A native failure raises the session error flag, logs the statement,
    /// and returns [`SessionError::ExecutionError`].
    pub fn exec(&self, statement: &str) -> Result<usize, SessionError> {
        let conn = lock(&self.inner.conn);
        let outcome = conn.execute(statement, []);
        drop(conn);
        outcome.map_err(|e| self.execution_fault(statement, &e))
    }

    /// Run a one-shot query and materialize its rows.
    ///
    /// # Errors
    /// Same failure capture as [`exec`](Self::exec).
    pub fn query(&self, statement: &str) -> Result<ResultSet, SessionError> {
        let conn = lock(&self.inner.conn);
        let outcome = conn
            .prepare(statement)
            .map_err(SessionError::Sqlite)
            .and_then(|mut stmt| build_result_set(&mut stmt));
        drop(conn);
        outcome.map_err(|e| self.execution_fault(statement, &e))
    }

    /// Run a one-shot query restricted to the safe fetch modes.
    ///
    /// Rows are addressable by name and by index, so `Assoc`, `Num`, and
    /// `Both` share one materialization; any other mode is rejected before
    /// reaching the native driver.
    ///
    /// # Errors
    /// [`SessionError::UsageError`] for an unsupported mode, otherwise as
    /// [`query`](Self::query).
    pub fn run(&self, statement: &str, mode: FetchMode) -> Result<ResultSet, SessionError> {
        if !matches!(mode, FetchMode::Assoc | FetchMode::Num | FetchMode::Both) {
            warn!(mode = ?mode, "invalid fetch mode defined");
            return Err(SessionError::UsageError(format!(
                "invalid fetch mode {mode:?}"
            )));
        }
        self.query(statement)
    }

    /// Register a default value for a parameter name, bound automatically
    /// onto every subsequently prepared statement that expects it.
    pub fn bind_value(
        &self,
        param: impl Into<ParamKey>,
        value: ParamValue,
        ty: ParamType,
        policy: NullPolicy,
    ) {
        lock(&self.inner.registry).insert(param.into(), RegisteredValue { value, ty, policy });
    }

    /// Remove a registry default. Returns whether it was present.
    pub fn unbind_value(&self, param: impl Into<ParamKey>) -> bool {
        lock(&self.inner.registry).remove(&param.into()).is_some()
    }

    /// Rowid of the most recent successful insert on this connection.
    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        lock(&self.inner.conn).last_insert_rowid()
    }

    pub(crate) fn execution_fault(&self, statement: &str, err: &dyn fmt::Display) -> SessionError {
        self.inner.note_error();
        error!(statement, error = %err, "statement could not be executed");
        SessionError::ExecutionError(format!("{statement}: {err}"))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("transaction_depth", &self.transaction_depth())
            .field("has_error", &self.has_error())
            .finish_non_exhaustive()
    }
}

/// Build a comma-separated placeholder list for an `IN (...)` clause.
///
/// Anonymous form yields `?,?,?`; the named form repeats `:key`, relying on
/// prepare-time rewriting to number the repeats (`:id,:id` becomes
/// `:id1,:id2` inside [`Session::prepare`]). A count of zero yields `''` so
/// the clause stays syntactically valid and matches nothing.
#[must_use]
pub fn build_in_string(count: usize, key: Option<&str>) -> String {
    if count == 0 {
        return "''".to_string();
    }
    let unit = match key {
        Some(key) => format!(":{key}"),
        None => "?".to_string(),
    };
    let mut out = String::with_capacity((unit.len() + 1) * count);
    for i in 0..count {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&unit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_string_anonymous() {
        assert_eq!(build_in_string(3, None), "?,?,?");
    }

    #[test]
    fn in_string_named_repeats_key() {
        assert_eq!(build_in_string(2, Some("id")), ":id,:id");
    }

    #[test]
    fn in_string_empty_count() {
        assert_eq!(build_in_string(0, Some("id")), "''");
        assert_eq!(build_in_string(0, None), "''");
    }
}
