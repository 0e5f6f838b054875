//! In-process cache storage.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::entry::CachedResponse;
use super::hash::RequestKey;
use super::storage::CacheStorage;
use crate::Error;

type Generation = Arc<DashMap<String, CachedResponse>>;

/// Cache storage backed by concurrent maps. Contents live as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<DashMap<String, Generation>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn generation(&self, name: &str) -> Generation {
        Arc::clone(self.generations.entry(name.to_string()).or_default().value())
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.generation(generation);
        Ok(())
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.generations.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        Ok(self.generations.remove(generation).is_some())
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error> {
        self.generation(generation)
            .insert(key.hash().to_string(), response.clone());
        Ok(())
    }

    async fn put_all(&self, generation: &str, entries: &[(RequestKey, CachedResponse)]) -> Result<(), Error> {
        let target = self.generation(generation);
        for (key, response) in entries {
            target.insert(key.hash().to_string(), response.clone());
        }
        Ok(())
    }

    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let Some(target) = self.generations.get(generation).map(|g| Arc::clone(g.value())) else {
            return Ok(None);
        };
        Ok(target.get(key.hash()).map(|e| e.value().clone()))
    }

    async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        Ok(self
            .generations
            .get(generation)
            .map(|g| g.len() as u64)
            .unwrap_or(0))
    }
}
