//! The extended prepared statement: multiplicity-aware binding, null-policy
//! coercion, execution, and result-shaping helpers.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use rusqlite::types::Value;
use tracing::error;

use crate::convert::{build_result_set, param_value_to_sqlite};
use crate::error::SessionError;
use crate::results::ResultSet;
use crate::session::{SessionInner, lock};
use crate::types::{ParamKey, ParamType, ParamValue};

mod binding;
mod fetch;

/// Ledger entry: the value and declared type most recently bound to a
/// placeholder. Diagnostics only — execution always rebinds from the same
/// data, never from the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: ParamValue,
    pub ty: ParamType,
}

/// Handle to a prepared statement owned by a [`Session`](crate::Session).
///
/// Handles are cheap to clone; two handles compare equal when they share
/// the same cached statement object. The native statement itself lives in
/// the driver's prepare cache and is re-entered on every
/// [`execute`](Self::execute).
#[derive(Clone)]
pub struct Statement {
    pub(crate) session: Arc<SessionInner>,
    pub(crate) inner: Arc<StatementInner>,
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.inner.sql)
            .field("fetch_friendly", &self.inner.fetch_friendly)
            .finish_non_exhaustive()
    }
}

pub(crate) struct StatementInner {
    pub(crate) sql: String,
    pub(crate) fetch_friendly: bool,
    pub(crate) state: Mutex<StatementState>,
}

pub(crate) struct StatementState {
    pub(crate) expected: HashMap<String, usize>,
    pub(crate) ledger: BTreeMap<ParamKey, BoundParam>,
    pub(crate) pending: BTreeMap<ParamKey, ParamValue>,
    pub(crate) last_execute_ok: bool,
    pub(crate) rows: ResultSet,
    pub(crate) cursor: usize,
}

fn is_fetch_friendly(sql: &str) -> bool {
    let head: String = sql
        .trim_start()
        .chars()
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    head.starts_with("SELECT") || head.starts_with("SHOW")
}

impl StatementInner {
    pub(crate) fn new(sql: String) -> Self {
        let fetch_friendly = is_fetch_friendly(&sql);
        Self {
            sql,
            fetch_friendly,
            state: Mutex::new(StatementState {
                expected: HashMap::new(),
                ledger: BTreeMap::new(),
                pending: BTreeMap::new(),
                last_execute_ok: false,
                rows: ResultSet::default(),
                cursor: 0,
            }),
        }
    }

    /// Replace the expected-multiplicity map. Called on every prepare, so a
    /// cache hit carries the map computed for that call rather than a stale
    /// one.
    pub(crate) fn set_expected(&self, expected: HashMap<String, usize>) {
        lock(&self.state).expected = expected;
    }
}

enum ExecOutcome {
    Rows(ResultSet),
    Affected(usize),
}

impl Statement {
    pub(crate) fn new(session: Arc<SessionInner>, inner: Arc<StatementInner>) -> Self {
        Self { session, inner }
    }

    /// The (rewritten) SQL text of this statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.inner.sql
    }

    /// Whether the statement is row-returning (starts with SELECT or SHOW).
    #[must_use]
    pub fn is_fetch_friendly(&self) -> bool {
        self.inner.fetch_friendly
    }

    /// Multiplicity of every named placeholder in the original query text.
    #[must_use]
    pub fn expected_parameters(&self) -> HashMap<String, usize> {
        lock(&self.inner.state).expected.clone()
    }

    /// Snapshot of the input-parameter ledger, for diagnostics.
    #[must_use]
    pub fn input_parameters(&self) -> Vec<(ParamKey, BoundParam)> {
        lock(&self.inner.state)
            .ledger
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Success or failure of the most recent execution.
    #[must_use]
    pub fn last_execute_succeeded(&self) -> bool {
        lock(&self.inner.state).last_execute_ok
    }

    /// Rows returned by the last query execution, or affected by the last
    /// DML execution.
    #[must_use]
    pub fn rows_affected(&self) -> usize {
        lock(&self.inner.state).rows.rows_affected
    }

    /// Render the statement text, expected multiplicities, and input ledger
    /// as a diagnostic string.
    #[must_use]
    pub fn debug_dump(&self) -> String {
        let state = lock(&self.inner.state);
        dump_with(&self.inner.sql, &state)
    }

    /// Execute the statement with the values bound so far.
    ///
    /// Row-returning statements materialize their rows and reset the fetch
    /// cursor; others record the affected row count. Returns the statement
    /// itself on success so calls can chain into the fetch helpers.
    ///
    /// # Errors
    /// A missing placeholder or native bind failure returns
    /// [`SessionError::BindError`]; a native execution failure returns
    /// [`SessionError::ExecutionError`]. Both raise the session error flag
    /// and log the statement with its full parameter dump.
    pub fn execute(&self) -> Result<&Self, SessionError> {
        let (bindings, dump) = {
            let state = lock(&self.inner.state);
            let bindings: Vec<(ParamKey, Value)> = state
                .pending
                .iter()
                .map(|(k, v)| (k.clone(), param_value_to_sqlite(v)))
                .collect();
            (bindings, dump_with(&self.inner.sql, &state))
        };

        let conn = lock(&self.session.conn);
        let mut stmt = match conn.prepare_cached(&self.inner.sql) {
            Ok(stmt) => stmt,
            Err(e) => {
                return Err(self.execute_fault(&dump, &e));
            }
        };

        // The native statement is shared through the driver's prepare cache;
        // reset every slot to NULL so no binding survives from an earlier
        // handle of the same SQL.
        for idx in 1..=stmt.parameter_count() {
            if let Err(e) = stmt.raw_bind_parameter(idx, Value::Null) {
                drop(stmt);
                drop(conn);
                return Err(self.execute_fault(&dump, &e));
            }
        }

        for (key, value) in bindings {
            let value_desc = format!("{value:?}");
            if let Err(message) = bind_native(&mut stmt, &key, value) {
                drop(stmt);
                drop(conn);
                return Err(self.bind_fault(&key, &value_desc, &dump, &message));
            }
        }

        let outcome = if self.inner.fetch_friendly {
            build_result_set(&mut stmt).map(ExecOutcome::Rows)
        } else {
            stmt.raw_execute()
                .map(ExecOutcome::Affected)
                .map_err(SessionError::Sqlite)
        };
        drop(stmt);
        drop(conn);

        match outcome {
            Ok(ExecOutcome::Rows(rows)) => {
                let mut state = lock(&self.inner.state);
                state.rows = rows;
                state.cursor = 0;
                state.last_execute_ok = true;
                Ok(self)
            }
            Ok(ExecOutcome::Affected(count)) => {
                let mut state = lock(&self.inner.state);
                let mut rows = ResultSet::default();
                rows.rows_affected = count;
                state.rows = rows;
                state.cursor = 0;
                state.last_execute_ok = true;
                Ok(self)
            }
            Err(e) => Err(self.execute_fault(&dump, &e)),
        }
    }

    /// Bind the given values positionally (1-based), then execute.
    ///
    /// Values bind as-is with no null-policy coercion; the ledger records
    /// each with its natural type.
    ///
    /// # Errors
    /// See [`execute`](Self::execute).
    pub fn execute_with(&self, params: &[ParamValue]) -> Result<&Self, SessionError> {
        {
            let mut state = lock(&self.inner.state);
            for (i, value) in params.iter().enumerate() {
                let key = ParamKey::Position(i + 1);
                state.ledger.insert(
                    key.clone(),
                    BoundParam {
                        value: value.clone(),
                        ty: ParamType::for_value(value),
                    },
                );
                state.pending.insert(key, value.clone());
            }
        }
        self.execute()
    }

    fn execute_fault(&self, dump: &str, err: &dyn std::fmt::Display) -> SessionError {
        self.session.note_error();
        lock(&self.inner.state).last_execute_ok = false;
        error!(statement = %self.inner.sql, error = %err, params = dump, "statement could not be executed");
        SessionError::ExecutionError(format!("{}: {err}", self.inner.sql))
    }

    fn bind_fault(&self, key: &ParamKey, value_desc: &str, dump: &str, message: &str) -> SessionError {
        self.session.note_error();
        error!(parameter = %key, value = value_desc, error = message, params = dump, "value could not be bound");
        SessionError::BindError(format!("{key}: {message}"))
    }
}

fn bind_native(
    stmt: &mut rusqlite::Statement<'_>,
    key: &ParamKey,
    value: Value,
) -> Result<(), String> {
    match key {
        ParamKey::Name(name) => {
            let full = format!(":{name}");
            let idx = stmt
                .parameter_index(&full)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("parameter {full} does not exist in the statement"))?;
            stmt.raw_bind_parameter(idx, value).map_err(|e| e.to_string())
        }
        ParamKey::Position(position) => {
            if *position == 0 || *position > stmt.parameter_count() {
                return Err(format!("parameter index {position} out of range"));
            }
            stmt.raw_bind_parameter(*position, value)
                .map_err(|e| e.to_string())
        }
    }
}

fn dump_with(sql: &str, state: &StatementState) -> String {
    let mut out = String::new();
    let _ = write!(out, "SQL: {sql}");
    if !state.expected.is_empty() {
        let mut expected: Vec<_> = state.expected.iter().collect();
        expected.sort();
        let _ = write!(out, "; expected: {expected:?}");
    }
    if !state.ledger.is_empty() {
        let _ = write!(out, "; bound: [");
        for (i, (key, param)) in state.ledger.iter().enumerate() {
            if i > 0 {
                let _ = write!(out, ", ");
            }
            let _ = write!(out, "{key}={:?} ({:?})", param.value, param.ty);
        }
        let _ = write!(out, "]");
    }
    out
}
