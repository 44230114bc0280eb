//! In-memory store for tests and deterministic simulation.

use crate::{next_prefix, KvStore, StoreError};
use im::OrdMap;
use std::ops::Bound;

/// In-memory key-value store backed by `im::OrdMap`.
///
/// Cloning is O(1) via structural sharing, so [`MemStore::snapshot`] is
/// cheap enough to take per transaction. Iteration order is ascending by
/// key, matching what a production backend provides.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    map: OrdMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a point-in-time snapshot. The snapshot and the live store
    /// share structure and diverge on write.
    pub fn snapshot(&self) -> MemStore {
        self.clone()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_> {
        let lower = Bound::Included(prefix.to_vec());
        let upper = match next_prefix(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        Box::new(
            self.map
                .range((lower, upper))
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }
}
