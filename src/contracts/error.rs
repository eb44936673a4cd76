use std::sync::{MutexGuard, PoisonError};

use thiserror::Error;

use crate::varint::VarintError;

#[derive(Error, Debug)]
pub enum CounterError {
    /// The backing store failed a has/get/put. Surfaced verbatim, never retried.
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed counter value at {key}: {source}")]
    MalformedValue {
        key: String,
        #[source]
        source: VarintError,
    },

    #[error("Counter overflow at {key}: already at u64::MAX")]
    Overflow { key: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Compare-and-swap lost the race {attempts} times in a row")]
    ContentionExhausted { attempts: u32 },
}

/// Extension trait for converting lock errors to CounterError.
pub trait LockResultExt<T> {
    /// Converts a lock error to a CounterError.
    fn map_lock_err(self) -> Result<T, CounterError>;
}

impl<'a, T> LockResultExt<MutexGuard<'a, T>>
    for Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>
{
    #[inline]
    fn map_lock_err(self) -> Result<MutexGuard<'a, T>, CounterError> {
        self.map_err(|e| CounterError::LockPoisoned(e.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("RocksDB error: {0}")]
    RocksDb(String),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Renders a store key for error messages and log fields.
pub(crate) fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
