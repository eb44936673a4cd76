use std::sync::{Arc, Mutex};

use crate::config::{ConsistencyMode, CounterConfig};
use crate::contracts::error::display_key;
use crate::contracts::{CounterError, KeyValueStore, LockResultExt, SequenceGenerator, StoreError};
use crate::varint::{decode_exact, encode_uvarint};

/// Sequence generator that persists every issued value to a key-value store.
///
/// Each `next()` reads the persisted value, writes its successor and returns
/// it, all while holding an instance-scoped mutex. Two instances over the
/// same store and key share one sequence but are not serialized against each
/// other unless `ConsistencyMode::CompareAndSwap` is used.
pub struct StoredCounter<S: ?Sized> {
    lock: Mutex<()>,
    store: Arc<S>,
    key: Vec<u8>,
    initial_value: u64,
    mode: ConsistencyMode,
}

impl<S: KeyValueStore + ?Sized> StoredCounter<S> {
    /// Creates a counter over `store` at `key` starting from 0.
    pub fn new(store: Arc<S>, key: impl Into<Vec<u8>>) -> Self {
        Self::with_initial_value(store, key, 0)
    }

    /// Creates a counter whose first issued value is `initial_value`.
    pub fn with_initial_value(store: Arc<S>, key: impl Into<Vec<u8>>, initial_value: u64) -> Self {
        Self {
            lock: Mutex::new(()),
            store,
            key: key.into(),
            initial_value,
            mode: ConsistencyMode::Locked,
        }
    }

    /// Creates a counter from a resolved configuration.
    ///
    /// Fails with `StoreError::Unsupported` when compare-and-swap mode is
    /// requested over a store that cannot do it atomically.
    pub fn with_config(
        store: Arc<S>,
        key: impl Into<Vec<u8>>,
        config: &CounterConfig,
    ) -> Result<Self, CounterError> {
        let mode = match config.mode {
            ConsistencyMode::CompareAndSwap { max_attempts } => {
                if !store.supports_compare_and_swap() {
                    return Err(StoreError::Unsupported("compare_and_swap").into());
                }
                ConsistencyMode::CompareAndSwap {
                    max_attempts: max_attempts.max(1),
                }
            }
            ConsistencyMode::Locked => ConsistencyMode::Locked,
        };

        let mut counter = Self::with_initial_value(store, key, config.initial_value);
        counter.mode = mode;
        Ok(counter)
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn initial_value(&self) -> u64 {
        self.initial_value
    }

    pub fn mode(&self) -> ConsistencyMode {
        self.mode
    }

    /// Reads the persisted value along with its raw bytes.
    /// Must be called with `lock` held.
    fn load(&self) -> Result<Option<(u64, Vec<u8>)>, CounterError> {
        if !self.store.has(&self.key)? {
            return Ok(None);
        }
        let bytes = self.store.get(&self.key)?;
        let value = decode_exact(&bytes).map_err(|source| {
            tracing::warn!(
                key = %display_key(&self.key),
                len = bytes.len(),
                error = %source,
                "refusing to increment malformed counter value"
            );
            CounterError::MalformedValue {
                key: display_key(&self.key),
                source,
            }
        })?;
        Ok(Some((value, bytes)))
    }

    fn successor(&self, current: Option<u64>) -> Result<u64, CounterError> {
        match current {
            None => {
                tracing::debug!(
                    key = %display_key(&self.key),
                    initial_value = self.initial_value,
                    "no persisted value, starting counter"
                );
                Ok(self.initial_value)
            }
            Some(v) => v.checked_add(1).ok_or_else(|| CounterError::Overflow {
                key: display_key(&self.key),
            }),
        }
    }

    fn next_locked(&self) -> Result<u64, CounterError> {
        let current = self.load()?.map(|(v, _)| v);
        let next = self.successor(current)?;
        self.store.put(&self.key, &encode_uvarint(next))?;
        Ok(next)
    }

    fn next_compare_and_swap(&self, max_attempts: u32) -> Result<u64, CounterError> {
        for attempt in 1..=max_attempts {
            let loaded = self.load()?;
            let next = self.successor(loaded.as_ref().map(|(v, _)| *v))?;
            let expected = loaded.as_ref().map(|(_, raw)| raw.as_slice());

            if self
                .store
                .compare_and_swap(&self.key, expected, &encode_uvarint(next))?
            {
                return Ok(next);
            }
            tracing::debug!(
                key = %display_key(&self.key),
                attempt,
                max_attempts,
                "counter changed underneath us, retrying"
            );
        }
        Err(CounterError::ContentionExhausted {
            attempts: max_attempts,
        })
    }
}

impl<S: KeyValueStore + ?Sized> SequenceGenerator for StoredCounter<S> {
    fn next(&self) -> Result<u64, CounterError> {
        // Guard drops on every return path, including errors
        let _guard = self.lock.lock().map_lock_err()?;

        let next = match self.mode {
            ConsistencyMode::Locked => self.next_locked()?,
            ConsistencyMode::CompareAndSwap { max_attempts } => {
                self.next_compare_and_swap(max_attempts)?
            }
        };

        tracing::trace!(key = %display_key(&self.key), value = next, "issued sequence number");
        Ok(next)
    }

    fn current(&self) -> Result<Option<u64>, CounterError> {
        let _guard = self.lock.lock().map_lock_err()?;
        Ok(self.load()?.map(|(v, _)| v))
    }
}

impl<S: ?Sized> std::fmt::Debug for StoredCounter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCounter")
            .field("key", &display_key(&self.key))
            .field("initial_value", &self.initial_value)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
