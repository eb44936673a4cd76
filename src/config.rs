//! Construction-time configuration for stored counters.
//!
//! Environment is read once by the wiring code and passed in explicitly;
//! the counter itself never touches process globals.

/// Environment variable holding the value issued when nothing is persisted yet.
pub const INITIAL_VALUE_ENV: &str = "STOREDCOUNTER_INITIAL_VALUE";
/// Environment variable enabling compare-and-swap mode with the given attempt limit.
pub const CAS_MAX_ATTEMPTS_ENV: &str = "STOREDCOUNTER_CAS_MAX_ATTEMPTS";

/// How `next()` guards its read-modify-write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyMode {
    /// In-process mutex only. Independent instances or processes sharing a
    /// key may race and lose updates.
    #[default]
    Locked,
    /// In-process mutex plus a conditional store write. A lost race re-reads
    /// and retries, up to `max_attempts` total attempts. Requires a store
    /// with atomic compare-and-swap.
    CompareAndSwap { max_attempts: u32 },
}

/// Configuration for a stored counter.
#[derive(Debug, Clone, Default)]
pub struct CounterConfig {
    /// Value issued by the first `next()` when the key is absent.
    pub initial_value: u64,
    /// Write guarding mode.
    pub mode: ConsistencyMode,
}

impl CounterConfig {
    /// Creates a CounterConfig from environment variables.
    ///
    /// Environment variables:
    /// - `STOREDCOUNTER_INITIAL_VALUE`: first value to issue (default: 0)
    /// - `STOREDCOUNTER_CAS_MAX_ATTEMPTS`: enables compare-and-swap mode (default: unset)
    ///
    /// An absent initial value or any unparsable value logs a warning and
    /// falls back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` but resolves variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        let initial_value = match parse_var(&lookup, INITIAL_VALUE_ENV) {
            Some(v) => v,
            None => {
                // Unparsable input already warned inside parse_var
                if lookup(INITIAL_VALUE_ENV).map_or(true, |v| v.trim().is_empty()) {
                    tracing::warn!(
                        var = INITIAL_VALUE_ENV,
                        default = default.initial_value,
                        "initial value not set, using default"
                    );
                }
                default.initial_value
            }
        };

        let mode = match parse_var::<u32>(&lookup, CAS_MAX_ATTEMPTS_ENV) {
            Some(0) => {
                tracing::warn!(
                    var = CAS_MAX_ATTEMPTS_ENV,
                    "compare-and-swap needs at least one attempt, using locked mode"
                );
                default.mode
            }
            Some(max_attempts) => ConsistencyMode::CompareAndSwap { max_attempts },
            None => default.mode,
        };

        Self {
            initial_value,
            mode,
        }
    }
}

/// Reads and parses one process environment variable.
/// Absent or empty yields `None` silently, unparsable yields `None` with a warning.
pub fn parse_env<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_var(&|name: &str| std::env::var(name).ok(), name)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(name)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(var = name, value = raw, error = %e, "ignoring unparsable env var");
            None
        }
    }
}
