//! Versioned cache generations.
//!
//! A generation is a named set of request-key → response entries. Storage is
//! pluggable through [`CacheStorage`]:
//!
//! - [`MemoryStorage`]: concurrent in-process maps
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, with schema migrations
//!
//! Only GET requests have a [`RequestKey`]; nothing else is ever stored.

pub mod connection;
pub mod entry;
pub mod generations;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use connection::CacheDb;
pub use entry::CachedResponse;
pub use hash::RequestKey;
pub use memory::MemoryStorage;
pub use storage::CacheStorage;

use std::sync::Arc;

use crate::Error;
use crate::config::{AppConfig, StorageKind};

/// Open the storage backend selected by `config`.
pub async fn open_storage(config: &AppConfig) -> Result<Arc<dyn CacheStorage>, Error> {
    match config.storage {
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::default())),
        StorageKind::Sqlite => {
            tracing::debug!(path = %config.db_path.display(), "opening sqlite cache");
            Ok(Arc::new(CacheDb::open(&config.db_path).await?))
        }
    }
}
