//! Connection configuration and the lazy connection holder.

use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;

use crate::error::SessionError;
use crate::session::Session;

fn default_true() -> bool {
    true
}

/// Options for opening a [`Session`].
///
/// ```rust
/// use sql_session::prelude::*;
///
/// let config = SessionConfig::new("app.db")
///     .with_wal(true)
///     .with_busy_timeout_ms(250);
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Database path, or `:memory:`.
    pub path: String,
    /// Open read-only.
    #[serde(default)]
    pub read_only: bool,
    /// Create the database file if it does not exist.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
    /// Apply `PRAGMA journal_mode = WAL` after opening.
    #[serde(default)]
    pub wal: bool,
    /// Busy handler timeout in milliseconds.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Capacity of the native driver's prepared-statement cache.
    #[serde(default)]
    pub statement_cache_capacity: Option<usize>,
}

impl SessionConfig {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
            create_if_missing: true,
            wal: false,
            busy_timeout_ms: None,
            statement_cache_capacity: None,
        }
    }

    /// Configuration for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = Some(capacity);
        self
    }

    /// Open a native connection with these options and wrap it in a
    /// [`Session`].
    ///
    /// # Errors
    /// Returns [`SessionError::ConnectionError`] if the database cannot be
    /// opened or configured. The caller decides termination policy; this
    /// layer never exits the process.
    pub fn connect(&self) -> Result<Session, SessionError> {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }

        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            SessionError::ConnectionError(format!("failed to open {}: {e}", self.path))
        })?;

        if let Some(millis) = self.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(millis)).map_err(|e| {
                SessionError::ConnectionError(format!("failed to set busy timeout: {e}"))
            })?;
        }
        if let Some(capacity) = self.statement_cache_capacity {
            conn.set_prepared_statement_cache_capacity(capacity);
        }
        if self.wal {
            conn.pragma_update(None, "journal_mode", "WAL").map_err(|e| {
                SessionError::ConnectionError(format!("failed to enable WAL: {e}"))
            })?;
        }

        Ok(Session::new(conn))
    }
}
