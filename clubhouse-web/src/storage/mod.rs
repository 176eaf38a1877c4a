//! Storage backends
//!
//! Both backends implement the user, document and audit traits from
//! `clubhouse-core`. [`Backends`] bundles them as trait objects for the
//! application state.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use clubhouse_core::{AuditLog, ClubResult, DocumentStore, StorageConfig, UserStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn UserStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub audit: Arc<dyn AuditLog>,
}

impl Backends {
    /// Use one store for all three concerns
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserStore + DocumentStore + AuditLog + 'static,
    {
        Self {
            users: store.clone(),
            documents: store.clone(),
            audit: store,
        }
    }

    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// SQLite when a database URL is configured, memory otherwise
    pub async fn from_config(config: &StorageConfig) -> ClubResult<Self> {
        match &config.database_url {
            #[cfg(feature = "sqlite")]
            Some(url) => {
                let store = SqliteStore::connect(url).await?;
                Ok(Self::from_store(Arc::new(store)))
            }
            #[cfg(not(feature = "sqlite"))]
            Some(url) => Err(clubhouse_core::config_error!(
                format!("database_url '{}' requires the sqlite feature", url),
                "storage",
                "Build with the `sqlite` feature or remove storage.database_url"
            )),
            None => {
                info!("No database configured, using in-memory storage");
                Ok(Self::memory())
            }
        }
    }
}
