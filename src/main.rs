use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use storedcounter::contracts::SequenceGenerator;
use storedcounter::storage::{RocksDbStore, StoredCounter};
use storedcounter::config::parse_env;
use storedcounter::CounterConfig;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("storedcounter=info".parse()?))
        .init();

    // Resolved once here and passed down explicitly
    let config = CounterConfig::from_env();

    let data_dir = std::env::var("STOREDCOUNTER_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let store = Arc::new(RocksDbStore::open(&data_dir)?);
    tracing::info!("Opened RocksDB at {}", data_dir);

    let key = std::env::var("STOREDCOUNTER_KEY").unwrap_or_else(|_| "/counter".into());
    let count: u64 = parse_env("STOREDCOUNTER_COUNT").unwrap_or(1);

    let counter = StoredCounter::with_config(store, key.as_str(), &config)?;
    tracing::info!(
        key = %key,
        initial_value = config.initial_value,
        mode = ?counter.mode(),
        "Counter ready"
    );

    for _ in 0..count {
        let value = counter.next()?;
        println!("{}", value);
    }

    Ok(())
}
