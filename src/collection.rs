//! Named connection holders and their registry.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::{Session, lock};

/// A named, lazily-opened connection.
///
/// The underlying [`Session`] is created on first use and shared by every
/// subsequent call (clones of the holder share it too).
#[derive(Clone)]
pub struct ConnectionHolder {
    name: String,
    config: SessionConfig,
    cell: Arc<Mutex<Option<Session>>>,
}

impl ConnectionHolder {
    #[must_use]
    pub fn new(name: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            name: name.into(),
            config,
            cell: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the underlying session has been opened yet.
    #[must_use]
    pub fn is_open(&self) -> bool {
        lock(&self.cell).is_some()
    }

    /// The held session, opening it on first use.
    ///
    /// # Errors
    /// Returns [`SessionError::ConnectionError`] if opening fails; a later
    /// call retries.
    pub fn session(&self) -> Result<Session, SessionError> {
        let mut cell = lock(&self.cell);
        if let Some(session) = cell.as_ref() {
            return Ok(session.clone());
        }
        let session = self.config.connect()?;
        *cell = Some(session.clone());
        Ok(session)
    }
}

/// A registry of [`ConnectionHolder`]s keyed by name.
#[derive(Clone, Default)]
pub struct ConnectionCollection {
    holders: BTreeMap<String, ConnectionHolder>,
}

impl ConnectionCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holders in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Add a holder under its own name, replacing any previous one.
    pub fn insert(&mut self, holder: ConnectionHolder) {
        self.holders.insert(holder.name().to_string(), holder);
    }

    /// Remove a holder by name.
    pub fn remove(&mut self, name: &str) -> Option<ConnectionHolder> {
        self.holders.remove(name)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.holders.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConnectionHolder> {
        self.holders.get(name)
    }

    /// Names of all holders, in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.holders.keys().map(String::as_str).collect()
    }

    /// All holders keyed by name.
    #[must_use]
    pub fn all(&self) -> &BTreeMap<String, ConnectionHolder> {
        &self.holders
    }

    /// A new collection holding only the entries the predicate keeps.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&ConnectionHolder) -> bool) -> Self {
        Self {
            holders: self
                .holders
                .iter()
                .filter(|(_, holder)| predicate(holder))
                .map(|(name, holder)| (name.clone(), holder.clone()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConnectionHolder)> {
        self.holders
            .iter()
            .map(|(name, holder)| (name.as_str(), holder))
    }
}

impl FromIterator<ConnectionHolder> for ConnectionCollection {
    fn from_iter<I: IntoIterator<Item = ConnectionHolder>>(iter: I) -> Self {
        let mut collection = Self::new();
        for holder in iter {
            collection.insert(holder);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(name: &str) -> ConnectionHolder {
        ConnectionHolder::new(name, SessionConfig::in_memory())
    }

    #[test]
    fn insert_and_lookup() {
        let mut collection = ConnectionCollection::new();
        assert!(collection.is_empty());
        collection.insert(holder("main"));
        collection.insert(holder("audit"));
        assert_eq!(collection.len(), 2);
        assert!(collection.has("main"));
        assert!(!collection.has("missing"));
        assert_eq!(collection.keys(), vec!["audit", "main"]);
    }

    #[test]
    fn filter_keeps_matching_holders() {
        let collection: ConnectionCollection =
            [holder("main"), holder("audit"), holder("metrics")]
                .into_iter()
                .collect();
        let filtered = collection.filter(|h| h.name().starts_with('m'));
        assert_eq!(filtered.keys(), vec!["main", "metrics"]);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn holder_opens_lazily_and_shares() {
        let holder = holder("lazy");
        assert!(!holder.is_open());
        let first = holder.session().unwrap();
        assert!(holder.is_open());
        let second = holder.session().unwrap();
        first.exec("CREATE TABLE t (a)").unwrap();
        // Same underlying connection: the table is visible to both handles.
        assert!(second.query("SELECT * FROM t").is_ok());
    }
}
