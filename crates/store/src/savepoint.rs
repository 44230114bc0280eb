//! Write-buffering overlay for speculative execution and rollback.

use crate::{KvStore, StoreError};
use std::collections::BTreeMap;

/// An overlay that captures writes without modifying the underlying store.
///
/// Reads check the overlay first, then fall through to the base store.
/// Writes and deletes only touch the overlay. Dropping the savepoint
/// discards every buffered mutation; [`Savepoint::commit`] applies them
/// to the base in key order.
///
/// This is the reversion point of the transaction pipeline: Check runs
/// against a savepoint that is always dropped, and Deliver runs against
/// one that is committed only when the handler succeeds.
pub struct Savepoint<'a> {
    base: &'a mut dyn KvStore,

    /// Buffered mutations. `Some(value)` is a pending write, `None` a
    /// pending delete.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> Savepoint<'a> {
    /// Open a savepoint over the given base store.
    pub fn new(base: &'a mut dyn KvStore) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered mutations.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Apply every buffered mutation to the base store.
    pub fn commit(self) -> Result<(), StoreError> {
        for (key, write) in self.writes {
            match write {
                Some(value) => self.base.set(&key, &value)?,
                None => self.base.delete(&key)?,
            }
        }
        Ok(())
    }
}

impl KvStore for Savepoint<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => self.base.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_> {
        // Merge base entries with buffered mutations for the prefix.
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self.base.iter_prefix(prefix).collect();
        for (key, write) in self.writes.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match write {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Box::new(merged.into_iter())
    }
}
