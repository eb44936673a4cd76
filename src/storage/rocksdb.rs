use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rocksdb::{Options, WriteOptions, DB};

use crate::contracts::error::display_key;
use crate::contracts::{KeyValueStore, StoreError};

/// RocksDB-backed durable key-value store.
///
/// RocksDB takes an exclusive LOCK file on the directory, so only one process
/// can have a given store open at a time.
pub struct RocksDbStore {
    db: DB,
    /// Held by every write so compare-and-swap's get + put cannot interleave with a put.
    write_lock: Mutex<()>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        // Values are a few bytes; LZ4 keeps SST overhead low without CPU cost
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        // Counter workloads are tiny; one background job is plenty
        opts.set_max_background_jobs(1);
        opts.set_keep_log_file_num(4);

        let db = DB::open(&opts, path).map_err(|e| StoreError::RocksDb(e.to_string()))?;
        tracing::debug!(path = %path.display(), "opened RocksDB store");

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    /// Flushes memtables to SST files.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::RocksDb(e.to_string()))
    }

    /// Every put is WAL-synced so an acknowledged value survives an OS crash.
    fn write_options() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Must be called with `write_lock` held.
    fn put_locked(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put_opt(key, value, &Self::write_options())
            .map_err(|e| StoreError::RocksDb(e.to_string()))
    }

    fn get_opt(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.db
            .get(key)
            .map_err(|e| StoreError::RocksDb(e.to_string()))
    }
}

impl KeyValueStore for RocksDbStore {
    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| StoreError::RocksDb(e.to_string()))
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.get_opt(key)?
            .ok_or_else(|| StoreError::NotFound(display_key(key)))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        self.put_locked(key, value)
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
        let _guard = self.lock_writes()?;

        let current = self.get_opt(key)?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        self.put_locked(key, new)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn create_test_store() -> (RocksDbStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn has_get_put() {
        let (store, _dir) = create_test_store();
        assert!(!store.has(b"/counter").unwrap());
        assert!(matches!(
            store.get(b"/counter"),
            Err(StoreError::NotFound(_))
        ));

        store.put(b"/counter", &[0x01]).unwrap();
        assert!(store.has(b"/counter").unwrap());
        assert_eq!(store.get(b"/counter").unwrap(), vec![0x01]);
    }

    #[test]
    fn empty_value_is_present() {
        let (store, _dir) = create_test_store();
        store.put(b"k", b"").unwrap();
        assert!(store.has(b"k").unwrap());
        assert_eq!(store.get(b"k").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn binary_keys_are_distinct() {
        let (store, _dir) = create_test_store();
        store.put(&[0x00, 0xff], b"a").unwrap();
        store.put(&[0x00, 0xfe], b"b").unwrap();
        assert_eq!(store.get(&[0x00, 0xff]).unwrap(), b"a");
        assert_eq!(store.get(&[0x00, 0xfe]).unwrap(), b"b");
    }

    #[test]
    fn compare_and_swap_matches_expected() {
        let (store, _dir) = create_test_store();
        assert!(store.compare_and_swap(b"k", None, b"1").unwrap());
        assert!(!store.compare_and_swap(b"k", None, b"2").unwrap());
        assert!(!store.compare_and_swap(b"k", Some(b"0"), b"2").unwrap());
        assert!(store.compare_and_swap(b"k", Some(b"1"), b"2").unwrap());
        assert_eq!(store.get(b"k").unwrap(), b"2");
    }

    #[test]
    fn compare_and_swap_never_overwrites_a_completed_put() {
        use std::sync::Arc;
        use std::thread;

        use crate::config::{ConsistencyMode, CounterConfig};
        use crate::contracts::SequenceGenerator;
        use crate::storage::StoredCounter;
        use crate::varint::{decode_exact, encode_uvarint};

        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
        let config = CounterConfig {
            initial_value: 0,
            mode: ConsistencyMode::CompareAndSwap {
                max_attempts: u32::MAX,
            },
        };
        let counter = StoredCounter::with_config(Arc::clone(&store), "/counter", &config).unwrap();

        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let incrementer = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(std::sync::atomic::Ordering::SeqCst) {
                    counter.next().unwrap();
                }
            })
        };

        for i in 1..=300u64 {
            let marker = i << 32;
            store.put(b"/counter", &encode_uvarint(marker)).unwrap();
            let seen = decode_exact(&store.get(b"/counter").unwrap()).unwrap();
            assert!(seen >= marker, "read {} after writing {}", seen, marker);
        }

        done.store(true, std::sync::atomic::Ordering::SeqCst);
        incrementer.join().unwrap();
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksDbStore::open(dir.path()).unwrap();
            store.put(b"/counter", &[0x2a]).unwrap();
        }
        let store = RocksDbStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"/counter").unwrap(), vec![0x2a]);
    }

    #[test]
    fn second_open_of_same_directory_fails() {
        let (_store, dir) = create_test_store();
        assert!(matches!(
            RocksDbStore::open(dir.path()),
            Err(StoreError::RocksDb(_))
        ));
    }
}
