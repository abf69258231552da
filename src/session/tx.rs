//! Savepoint-emulated transaction nesting.
//!
//! The native driver supports one transaction level; logical nesting maps
//! depth 1 to the native transaction and every deeper level to a
//! `SAVEPOINT LEVEL<n>` marker. An error flagged anywhere inside the
//! outermost transaction forces a full rollback at commit time, regardless
//! of nested commits having already released their savepoints.

use tracing::warn;

use super::{Session, lock};
use crate::error::SessionError;

impl Session {
    /// Start a transaction, or push one savepoint level if a transaction is
    /// already open.
    ///
    /// # Errors
    /// Returns the native error if the outermost `BEGIN` fails (depth is
    /// left at zero). Savepoint creation at deeper levels reports failure
    /// through the [`exec`](Self::exec) error path instead: the session
    /// error flag is raised and the depth still increments.
    pub fn begin(&self) -> Result<(), SessionError> {
        let mut depth = lock(&self.inner.depth);
        if *depth == 0 {
            let conn = lock(&self.inner.conn);
            let outcome = conn.execute_batch("BEGIN");
            drop(conn);
            outcome.map_err(SessionError::Sqlite)?;
            *depth = 1;
            return Ok(());
        }

        let savepoint = format!("SAVEPOINT LEVEL{}", *depth);
        let _ = self.exec(&savepoint);
        *depth += 1;
        Ok(())
    }

    /// Commit one transaction level.
    ///
    /// At a nested level this releases the matching savepoint. At the
    /// outermost level, a raised error flag turns the commit into a native
    /// rollback: the flag is cleared and the commit reports failure. With
    /// no open transaction this is a pass-through no-op.
    ///
    /// # Errors
    /// [`SessionError::ExecutionError`] when a raised error flag forced a
    /// rollback; the native error if the `COMMIT` itself fails.
    pub fn commit(&self) -> Result<(), SessionError> {
        let mut depth = lock(&self.inner.depth);
        if *depth == 0 {
            return Ok(());
        }
        *depth -= 1;

        if *depth > 0 {
            let release = format!("RELEASE SAVEPOINT LEVEL{}", *depth);
            let _ = self.exec(&release);
            return Ok(());
        }

        let conn = lock(&self.inner.conn);
        let native_open = !conn.is_autocommit();
        if self.has_error() && native_open {
            self.clear_error();
            let outcome = conn.execute_batch("ROLLBACK");
            drop(conn);
            outcome.map_err(SessionError::Sqlite)?;
            return Err(SessionError::ExecutionError(
                "commit aborted; transaction rolled back after a prior statement failure".into(),
            ));
        }
        let outcome = conn.execute_batch("COMMIT");
        drop(conn);
        outcome.map_err(SessionError::Sqlite)
    }

    /// Roll back one transaction level.
    ///
    /// At a nested level this rolls back to the matching savepoint; at the
    /// outermost level it issues the native rollback and lowers the error
    /// flag.
    ///
    /// # Errors
    /// Calling with no transaction open is a programming error and returns
    /// [`SessionError::UsageError`] without touching the native driver.
    pub fn rollback(&self) -> Result<(), SessionError> {
        let mut depth = lock(&self.inner.depth);
        if *depth == 0 {
            warn!("rollback requested with no transaction started");
            return Err(SessionError::UsageError(
                "rollback error: there is no transaction started".into(),
            ));
        }
        *depth -= 1;

        if *depth > 0 {
            let to_savepoint = format!("ROLLBACK TO SAVEPOINT LEVEL{}", *depth);
            let _ = self.exec(&to_savepoint);
            return Ok(());
        }

        let conn = lock(&self.inner.conn);
        let outcome = conn.execute_batch("ROLLBACK");
        drop(conn);
        outcome.map_err(SessionError::Sqlite)?;
        self.clear_error();
        Ok(())
    }

    /// Current logical nesting depth (0 = no open transaction).
    #[must_use]
    pub fn transaction_depth(&self) -> u32 {
        *lock(&self.inner.depth)
    }

    /// Whether a logical transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction_depth() > 0
    }
}
