//! The cache controller.
//!
//! Owns one cache generation and drives it through the worker lifecycle:
//!
//! - **Install** opens the generation and primes the shell routes, all or
//!   nothing, then skips waiting and activates at once.
//! - **Activate** deletes every other generation and claims clients.
//! - **Fetch** is network-first: a live response is returned immediately and
//!   a copy is written to the cache in the background; on a network failure
//!   the current generation answers if it can. Non-GET requests never touch
//!   the cache.
//!
//! Requests carrying `Cookie` or `Authorization` are cached under a key
//! scoped to those credentials, and `Set-Cookie` is never stored.

mod stats;

pub use stats::{ControllerStats, FetchOutcome, StatsSnapshot, WriteGuard};

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::{Mutex, watch};
use url::Url;

use crate::cache::{CacheStorage, CachedResponse, RequestKey};
use crate::config::AppConfig;
use crate::exchange::{Request, Response};
use crate::lifecycle::{Effect, Event, Lifecycle, Transition};
use crate::network::Network;
use crate::Error;

/// What a controller needs to know about its deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Name of the generation this controller owns.
    pub version: String,
    /// Paths primed at install, resolved against `origin`.
    pub shell_routes: Vec<String>,
    /// Origin the shell routes are fetched from.
    pub origin: Url,
}

impl ControllerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            version: config.cache_version.clone(),
            shell_routes: config.shell_routes.clone(),
            origin: config.upstream_url()?,
        })
    }
}

/// A response together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub outcome: FetchOutcome,
}

/// Network-first cache controller for one generation.
pub struct CacheController {
    config: ControllerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: watch::Sender<Lifecycle>,
    transitions: Mutex<()>,
    stats: Arc<ControllerStats>,
}

impl CacheController {
    pub fn new(config: ControllerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        let (state, _) = watch::channel(Lifecycle::Parsed);
        Self { config, storage, network, state, transitions: Mutex::new(()), stats: Arc::default() }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn state(&self) -> Lifecycle {
        *self.state.borrow()
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Handle the install event. On success the controller activates
    /// immediately and is `Active` when this returns.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any shell route could not be primed;
    /// the controller is then `Redundant` and nothing was stored.
    pub async fn install(&self) -> Result<(), Error> {
        let transition = {
            let _serial = self.transitions.lock().await;
            let transition = self.begin(&Event::Install)?;
            tracing::info!(version = %self.config.version, "installing cache generation");
            self.finish(self.run_effects(&transition.effects).await)?;
            transition
        };

        if transition.effects.contains(&Effect::SkipWaiting) {
            self.activate().await?;
        }
        Ok(())
    }

    /// Handle the activate event.
    pub async fn activate(&self) -> Result<(), Error> {
        let _serial = self.transitions.lock().await;
        let transition = self.begin(&Event::Activate)?;
        self.finish(self.run_effects(&transition.effects).await)
    }

    /// Handle a fetch event.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` only when the network failed and, for an
    /// intercepted request, the current generation had no matching entry.
    pub async fn handle_fetch(&self, request: Request) -> Result<Served, Error> {
        let state = self.state_for_fetch().await;
        let transition = state.plan(&Event::Fetch { method: request.method.clone() }, &self.config.version, &[])?;

        match transition.effects.first() {
            Some(Effect::Intercept) => self.network_first(request).await,
            _ => self.passthrough(request).await,
        }
    }

    /// Wait for background cache writes started so far to finish.
    pub async fn settle_writes(&self) {
        self.stats.writes_settled().await;
    }

    fn begin(&self, event: &Event) -> Result<Transition, Error> {
        let transition = self
            .state()
            .plan(event, &self.config.version, &self.config.shell_routes)?;
        self.state.send_replace(transition.next);
        Ok(transition)
    }

    fn finish(&self, outcome: Result<(), Error>) -> Result<(), Error> {
        let next = self.state().settle(outcome.is_ok());
        self.state.send_replace(next);
        match &outcome {
            Ok(()) => tracing::info!(version = %self.config.version, state = ?next, "lifecycle step complete"),
            Err(e) => tracing::error!(version = %self.config.version, state = ?next, error = %e, "lifecycle step failed"),
        }
        outcome
    }

    async fn run_effects(&self, effects: &[Effect]) -> Result<(), Error> {
        for effect in effects {
            match effect {
                Effect::OpenGeneration(name) => self.storage.open(name).await?,
                Effect::PrimeShell(routes) => self.prime_shell(routes).await?,
                Effect::PurgeStaleGenerations { keep } => self.purge_stale(keep).await?,
                Effect::ClaimClients => {
                    tracing::info!(version = %self.config.version, "claiming open clients");
                }
                // SkipWaiting runs once install has settled; fetch effects
                // are dispatched by handle_fetch.
                Effect::SkipWaiting | Effect::Intercept | Effect::Passthrough => {}
            }
        }
        Ok(())
    }

    async fn prime_shell(&self, routes: &[String]) -> Result<(), Error> {
        let entries = try_join_all(routes.iter().map(|route| self.fetch_shell_route(route))).await?;
        self.storage.put_all(&self.config.version, &entries).await?;
        tracing::info!(version = %self.config.version, routes = entries.len(), "primed shell routes");
        Ok(())
    }

    async fn fetch_shell_route(&self, route: &str) -> Result<(RequestKey, CachedResponse), Error> {
        let failed = |reason: String| Error::InstallFailed { route: route.to_string(), reason };

        let url = self.config.origin.join(route).map_err(|e| failed(e.to_string()))?;
        let request = Request::get(url);
        let response = self
            .network
            .send(&request)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.is_ok() {
            return Err(failed(format!("status {}", response.status.as_u16())));
        }

        let key = RequestKey::for_request(&request).ok_or_else(|| failed("not a GET request".to_string()))?;
        Ok((key, CachedResponse::capture(&request, &response)))
    }

    async fn purge_stale(&self, keep: &str) -> Result<(), Error> {
        let stale: Vec<String> = self
            .storage
            .generations()
            .await?
            .into_iter()
            .filter(|name| name != keep)
            .collect();

        try_join_all(stale.iter().map(|name| self.storage.delete(name))).await?;
        if !stale.is_empty() {
            tracing::info!(kept = keep, deleted = ?stale, "purged stale cache generations");
        }
        Ok(())
    }

    /// Current state, waiting out an activation in progress so no fetch is
    /// served against a half-purged store.
    async fn state_for_fetch(&self) -> Lifecycle {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|state| *state != Lifecycle::Activating)
            .await
            .map(|state| *state);
        settled.unwrap_or_else(|_| self.state())
    }

    async fn passthrough(&self, request: Request) -> Result<Served, Error> {
        match self.network.send(&request).await {
            Ok(response) => {
                self.stats.record(FetchOutcome::Bypass);
                Ok(Served { response, outcome: FetchOutcome::Bypass })
            }
            Err(e) => {
                self.stats.record_failure();
                Err(e.into())
            }
        }
    }

    async fn network_first(&self, request: Request) -> Result<Served, Error> {
        let network_error = match self.network.send(&request).await {
            Ok(response) => {
                if response.is_storable() {
                    self.store_in_background(&request, &response);
                }
                self.stats.record(FetchOutcome::Network);
                return Ok(Served { response, outcome: FetchOutcome::Network });
            }
            Err(e) => e,
        };

        match self.storage.match_request(&self.config.version, &request).await {
            Ok(Some(cached)) => {
                tracing::info!(url = %request.url, error = %network_error, "network failed, serving cached response");
                self.stats.record(FetchOutcome::CacheFallback);
                Ok(Served { response: cached.to_response(), outcome: FetchOutcome::CacheFallback })
            }
            Ok(None) => {
                tracing::debug!(url = %request.url, error = %network_error, "network failed and no cached response");
                self.stats.record_failure();
                Err(network_error.into())
            }
            Err(cache_error) => {
                tracing::warn!(url = %request.url, error = %cache_error, "cache lookup failed during fallback");
                self.stats.record_failure();
                Err(network_error.into())
            }
        }
    }

    /// Write a snapshot of `response` without holding up the caller.
    ///
    /// The write runs on its own task and completes even if the requester
    /// goes away. Failures are logged and counted, never surfaced. A private
    /// response is only stored under its requester's credentials.
    fn store_in_background(&self, request: &Request, response: &Response) {
        let Some(key) = RequestKey::for_request(request) else {
            return;
        };
        if response.is_private() && !key.is_scoped() {
            tracing::debug!(url = key.url(), "private response to an anonymous request, not cached");
            return;
        }
        let snapshot = CachedResponse::capture(request, response);
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);
        let generation = self.config.version.clone();
        let guard = stats.begin_write();

        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = storage.put(&generation, &key, &snapshot).await {
                stats.record_write_failure();
                tracing::warn!(url = key.url(), error = %e, "cache write failed");
            }
        });
    }
}
