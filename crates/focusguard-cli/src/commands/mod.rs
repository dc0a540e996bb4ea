pub mod block;
pub mod config;
pub mod settings;
pub mod stats;
pub mod timer;
pub mod visit;

use std::sync::{Arc, Mutex};

use focusguard_core::{Config, Database, SharedDatabase, Store};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the database once and build the store on top of it. Settings are
/// seeded from the configured defaults the first time.
pub fn open_shared(
    config: &Config,
) -> Result<(SharedDatabase, Arc<Store>), Box<dyn std::error::Error>> {
    let db: SharedDatabase = Arc::new(Mutex::new(Database::open()?));
    let store = Store::new(Box::new(Arc::clone(&db)));
    if store.settings()?.is_none() {
        store.set_settings(&config.defaults)?;
        tracing::debug!("seeded settings from config defaults");
    }
    Ok((db, Arc::new(store)))
}

pub fn open_store(config: &Config) -> Result<Arc<Store>, Box<dyn std::error::Error>> {
    open_shared(config).map(|(_, store)| store)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
