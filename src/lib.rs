pub mod config;
pub mod contracts;
pub mod storage;
pub mod varint;

pub use config::{ConsistencyMode, CounterConfig};
pub use contracts::{CounterError, KeyValueStore, SequenceGenerator, StoreError};
pub use storage::{MemoryStore, RocksDbStore, StoredCounter};
