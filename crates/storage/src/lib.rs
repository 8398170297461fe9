pub mod db;
pub mod persistence;
pub mod repositories;
pub mod store;

pub use persistence::{PersistenceAdapter, SETTINGS_KEY, SIGNALS_KEY};
pub use repositories::SqliteKvStore;
pub use store::{KeyValueStore, StorageError};
