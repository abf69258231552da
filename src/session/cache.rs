//! Prepared-statement reuse keyed by rewritten query text and options.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use super::{RegisteredValue, Session, lock};
use crate::error::SessionError;
use crate::rewrite::{RewrittenQuery, rewrite};
use crate::statement::{Statement, StatementInner};
use crate::types::ParamKey;

/// Whether prepare applies named-placeholder rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RewriteMode {
    /// Rewrite repeated named placeholders (the default).
    #[default]
    On,
    /// Pass the query text through untouched; no multiplicity map.
    Off,
}

/// Whether prepare consults the statement cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CachePolicy {
    /// Reuse the cached statement for an identical fingerprint (the default).
    #[default]
    Use,
    /// Always produce a fresh statement, leaving the cache untouched.
    Bypass,
}

/// Per-prepare options. Part of the cache fingerprint: the same query text
/// prepared under different options yields distinct statements.
///
/// ```rust
/// use sql_session::prelude::*;
///
/// let options = StatementOptions::default().with_rewrite(RewriteMode::Off);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatementOptions {
    pub rewrite: RewriteMode,
    pub cache: CachePolicy,
}

impl StatementOptions {
    #[must_use]
    pub fn with_rewrite(mut self, rewrite: RewriteMode) -> Self {
        self.rewrite = rewrite;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }
}

/// Cache fingerprint: rewritten query text plus the option set it was
/// prepared under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    sql: String,
    options: StatementOptions,
}

pub(crate) type StatementCache = HashMap<CacheKey, Arc<StatementInner>>;

impl Session {
    /// Prepare a statement with default options.
    ///
    /// # Errors
    /// See [`prepare_with_options`](Self::prepare_with_options).
    pub fn prepare(&self, query: &str) -> Result<Statement, SessionError> {
        self.prepare_with_options(query, StatementOptions::default())
    }

    /// Prepare a statement: rewrite repeated named placeholders, reuse a
    /// cached statement for an identical fingerprint, and apply matching
    /// registry defaults.
    ///
    /// A cache hit returns the identical shared statement object (two
    /// `Statement`s compare equal when they share it); its
    /// expected-multiplicity map is re-applied from this call's rewrite,
    /// since the map is call-local bookkeeping even when the object is
    /// shared. Cache entries live until [`clear_statement_cache`]
    /// (Self::clear_statement_cache) or the end of the session.
    ///
    /// # Errors
    /// A native prepare failure raises the session error flag, logs the
    /// attempted query, and returns [`SessionError::PreparationError`].
    pub fn prepare_with_options(
        &self,
        query: &str,
        options: StatementOptions,
    ) -> Result<Statement, SessionError> {
        let rewritten = match options.rewrite {
            RewriteMode::On => rewrite(query),
            RewriteMode::Off => RewrittenQuery {
                sql: query.to_string(),
                expected: HashMap::new(),
            },
        };

        let inner = match options.cache {
            CachePolicy::Use => {
                let key = CacheKey {
                    sql: rewritten.sql.clone(),
                    options,
                };
                let mut cache = lock(&self.inner.cache);
                if let Some(hit) = cache.get(&key) {
                    Arc::clone(hit)
                } else {
                    let fresh = Arc::new(self.native_prepare(&rewritten.sql)?);
                    cache.insert(key, Arc::clone(&fresh));
                    fresh
                }
            }
            CachePolicy::Bypass => Arc::new(self.native_prepare(&rewritten.sql)?),
        };

        inner.set_expected(rewritten.expected.clone());
        let statement = Statement::new(Arc::clone(&self.inner), inner);

        let defaults: Vec<(String, RegisteredValue)> = {
            let registry = lock(&self.inner.registry);
            rewritten
                .expected
                .keys()
                .filter_map(|name| {
                    registry
                        .get(&ParamKey::Name(name.clone()))
                        .map(|entry| (name.clone(), entry.clone()))
                })
                .collect()
        };
        for (name, entry) in defaults {
            statement.bind_value(ParamKey::Name(name), entry.value, entry.ty, entry.policy)?;
        }

        Ok(statement)
    }

    /// Drop every cached statement; the next prepare of any query re-prepares
    /// it against the native driver.
    pub fn clear_statement_cache(&self) {
        lock(&self.inner.cache).clear();
    }

    /// Number of distinct fingerprints currently cached.
    #[must_use]
    pub fn statement_cache_len(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    fn native_prepare(&self, sql: &str) -> Result<StatementInner, SessionError> {
        let conn = lock(&self.inner.conn);
        let outcome = conn.prepare_cached(sql).map(|_| ());
        drop(conn);
        if let Err(e) = outcome {
            self.inner.note_error();
            error!(statement = sql, error = %e, "statement could not be prepared");
            return Err(SessionError::PreparationError(format!("{sql}: {e}")));
        }
        Ok(StatementInner::new(sql.to_string()))
    }
}
