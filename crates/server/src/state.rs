use std::sync::Arc;

use relme_client::{FetchClient, FetchConfig, HttpProfileFetcher, WebfingerResolver};
use relme_core::{AppConfig, Error, HrefStoreAccess, ProfileCache};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: ProfileCache,
    pub resolver: WebfingerResolver,
}

impl AppState {
    /// Wire the resolver and the profile cache over `store`.
    pub fn from_config(config: &AppConfig, store: Arc<dyn HrefStoreAccess>) -> Result<Self, Error> {
        let client = FetchClient::new(FetchConfig::from(config))?;
        let resolver = WebfingerResolver::new(client, config.max_concurrency);
        let fetcher = Arc::new(HttpProfileFetcher::new(resolver.clone()));
        let cache = ProfileCache::new(store, fetcher, config.freshness_policy());
        Ok(Self { cache, resolver })
    }
}
