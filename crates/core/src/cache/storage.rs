//! The named key-value blob cache the controller writes generations into.

use async_trait::async_trait;

use super::entry::CachedResponse;
use super::hash::RequestKey;
use crate::Error;
use crate::exchange::Request;

/// Storage for named cache generations.
///
/// Writes to different keys may run concurrently. Concurrent writes to the
/// same key resolve last-write-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if absent.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Names of every generation currently held, sorted.
    async fn generations(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if the generation did not exist.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// Store one entry, overwriting any previous entry for the key.
    /// Creates the generation if absent.
    async fn put(&self, generation: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error>;

    /// Store a batch of entries. Either every entry is committed or none is.
    async fn put_all(&self, generation: &str, entries: &[(RequestKey, CachedResponse)]) -> Result<(), Error>;

    /// Look up the entry stored under a key.
    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error>;

    /// Number of entries in a generation (0 if absent).
    async fn entry_count(&self, generation: &str) -> Result<u64, Error>;

    /// Find the stored response that answers `request`, honouring `Vary`.
    ///
    /// A credentialed request sees its own entry first, then the public one.
    async fn match_request(&self, generation: &str, request: &Request) -> Result<Option<CachedResponse>, Error> {
        let Some(key) = RequestKey::for_request(request) else {
            return Ok(None);
        };
        if let Some(cached) = self.lookup(generation, &key).await?.filter(|c| c.matches(request)) {
            return Ok(Some(cached));
        }
        if !key.is_scoped() {
            return Ok(None);
        }

        let Some(public) = RequestKey::public(request) else {
            return Ok(None);
        };
        let cached = self.lookup(generation, &public).await?;
        Ok(cached.filter(|c| c.matches(request)))
    }
}
