use crate::contracts::error::StoreError;

/// Durable mapping from byte keys to byte values.
///
/// The counter treats implementations as a black box with last-write-wins
/// semantics on a single key. Implementations own their own lifecycle; the
/// counter only borrows them through an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Returns true if a value is stored under `key`.
    fn has(&self, key: &[u8]) -> Result<bool, StoreError>;

    /// Returns the value stored under `key`.
    /// A missing key is `StoreError::NotFound`.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;

    /// Stores `value` under `key`, overwriting any existing value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Returns true if `compare_and_swap` is implemented atomically.
    fn supports_compare_and_swap(&self) -> bool {
        false
    }

    /// Atomically replaces the value under `key` with `new` if the current
    /// value equals `expected` (`None` meaning absent).
    ///
    /// Returns `Ok(false)` when the current value did not match.
    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, StoreError> {
        let _ = (key, expected, new);
        Err(StoreError::Unsupported("compare_and_swap"))
    }
}
