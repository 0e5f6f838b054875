//! Shared state handed to every route.

use std::sync::Arc;

use url::Url;
use wishlist_edge_client::{FetchConfig, HttpNetwork};
use wishlist_edge_core::{AppConfig, CacheController, ControllerConfig, Error, Ingestor, open_storage};

pub struct AppState {
    pub controller: Arc<CacheController>,
    pub ingestor: Ingestor,
    /// Origin every proxied request is sent to.
    pub upstream: Url,
}

impl AppState {
    pub fn new(controller: Arc<CacheController>, ingestor: Ingestor, upstream: Url) -> Self {
        Self { controller, ingestor, upstream }
    }

    /// Wire storage, network and controller from configuration.
    ///
    /// The controller is returned uninstalled.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let storage = open_storage(config).await?;
        let network = Arc::new(HttpNetwork::new(&FetchConfig::from_app(config))?);
        let controller = CacheController::new(ControllerConfig::from_app(config)?, storage, network);

        Ok(Self::new(
            Arc::new(controller),
            Ingestor::new(config.share_destination.as_str()),
            config.upstream_url()?,
        ))
    }
}
