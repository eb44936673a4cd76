pub mod error;
pub mod sequence;
pub mod store;

pub use error::{CounterError, LockResultExt, StoreError};
pub use sequence::SequenceGenerator;
pub use store::KeyValueStore;
