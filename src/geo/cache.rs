//! Persistent lookup cache
//!
//! One JSON file per cache, holding a single top-level map. The whole map
//! is loaded at startup and rewritten through a temporary file on every new
//! entry, so an interrupted write can never corrupt previous entries. A key
//! is written at most once: negative results are cached like positive ones
//! so a failed lookup is never retried against the network.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// A persistent map from normalized query keys to lookup results
pub struct GeoCache<V> {
    path: PathBuf,
    entries: HashMap<String, V>,
}

impl<V> GeoCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Loads a cache from disk
    ///
    /// A missing, unreadable, or malformed file yields an empty cache; the
    /// file will be recreated on the first store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, V>>(&raw) {
                Ok(entries) => {
                    tracing::info!(
                        "Loaded {} cache entries from {}",
                        entries.len(),
                        path.display()
                    );
                    entries
                }
                Err(e) => {
                    tracing::warn!(
                        "Error reading cache {}; starting with empty cache: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => {
                tracing::info!("Starting with empty cache at {}", path.display());
                HashMap::new()
            }
        };

        Self { path, entries }
    }

    /// Returns the cached value for a key, if present
    pub fn lookup(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Inserts a value and persists the cache
    ///
    /// First write wins: storing under an existing key leaves the original
    /// value untouched and does not touch the file.
    pub fn store(&mut self, key: &str, value: V) -> crate::Result<()> {
        if self.entries.contains_key(key) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> crate::Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
