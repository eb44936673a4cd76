mod memory;
mod rocksdb;
mod sequence;

pub use memory::MemoryStore;
pub use rocksdb::RocksDbStore;
pub use sequence::StoredCounter;
