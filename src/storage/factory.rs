//! Store factory.
//!
//! Resolves the configured provider into a shared [`EntityStore`] once, so
//! the services never branch on the provider themselves.

use super::{EntityStore, MemoryStore, SqliteStore};
use crate::config::{StockpileConfig, StoreProvider};
use crate::{Error, Result};
use std::sync::Arc;

/// Factory for creating entity stores.
///
/// # Example
///
/// ```rust,ignore
/// use stockpile::{StockpileConfig, StoreFactory};
///
/// let config = StockpileConfig::load(None)?;
/// let store = StoreFactory::create(&config)?;
/// println!("using {}", store.provider());
/// ```
pub struct StoreFactory;

impl StoreFactory {
    /// Creates the store selected by `config.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the `SQLite` provider is selected
    /// without a database path, or a remote error if the database cannot be
    /// opened.
    pub fn create(config: &StockpileConfig) -> Result<Arc<dyn EntityStore>> {
        match config.provider {
            StoreProvider::Memory => {
                tracing::debug!("Created in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            },
            StoreProvider::Sqlite => {
                let Some(path) = config.sqlite.db_path.as_deref() else {
                    return Err(Error::Configuration(
                        "sqlite provider requires a database path (set DB_PATH or [sqlite] db_path)"
                            .to_string(),
                    ));
                };
                match SqliteStore::new(path) {
                    Ok(store) => {
                        tracing::debug!(path = %path.display(), "Created SQLite store");
                        Ok(Arc::new(store))
                    },
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to open SQLite store"
                        );
                        Err(e)
                    },
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_provider() {
        let config = StockpileConfig::default().with_provider(StoreProvider::Memory);
        let store = StoreFactory::create(&config).unwrap();
        assert_eq!(store.provider(), "memory");
    }

    #[test]
    fn test_sqlite_requires_path() {
        let config = StockpileConfig::default();
        let result = StoreFactory::create(&config);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_sqlite_provider() {
        let dir = TempDir::new().unwrap();
        let config = StockpileConfig::default().with_db_path(dir.path().join("stock.db"));
        let store = StoreFactory::create(&config).unwrap();
        assert_eq!(store.provider(), "sqlite");
    }
}
