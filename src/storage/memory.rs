use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::contracts::error::display_key;
use crate::contracts::{KeyValueStore, StoreError};

/// In-process key-value store backed by a concurrent map.
///
/// Nothing is persisted beyond the lifetime of the value, but distinct
/// counters sharing one `Arc<MemoryStore>` observe each other's writes the
/// same way they would against a durable store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.entries
            .get(key)
            .map(|v| v.value().clone())
            .ok_or_else(|| StoreError::NotFound(display_key(key)))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn supports_compare_and_swap(&self) -> bool {
        true
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, StoreError> {
        // The entry holds the shard lock, so compare and write are one step
        match self.entries.entry(key.to_vec()) {
            Entry::Occupied(mut entry) => {
                if expected == Some(entry.get().as_slice()) {
                    entry.insert(new.to_vec());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(entry) => {
                if expected.is_none() {
                    entry.insert(new.to_vec());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }
}
