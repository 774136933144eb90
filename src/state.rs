use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cache::SearchCache;
use crate::config::Config;
use crate::db::Store;
use crate::services::ListingService;

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub search_cache: SearchCache,

    pub listing_service: ListingService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let search_cache = SearchCache::new(store.cache_backend(), config.cache.enabled);
        let cache_ttl = Duration::from_secs(config.cache.ttl_seconds);

        let listing_service =
            ListingService::new(store.clone(), search_cache.clone(), cache_ttl);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            search_cache,
            listing_service,
        })
    }
}
