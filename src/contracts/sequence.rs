use crate::contracts::error::CounterError;

/// Generates strictly increasing sequence numbers backed by durable storage.
///
/// # Invariants
/// - Values returned by one instance are strictly increasing with step 1
/// - The last issued value survives process restart
/// - Calls on one instance are serialized into a total order
pub trait SequenceGenerator: Send + Sync {
    /// Returns the next sequence number and persists it before returning.
    fn next(&self) -> Result<u64, CounterError>;

    /// Returns the last persisted sequence number without incrementing.
    /// `None` if nothing has been issued yet.
    fn current(&self) -> Result<Option<u64>, CounterError>;
}
