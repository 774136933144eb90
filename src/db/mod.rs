use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::CacheBackend;
use crate::models::listing::{Listing, ListingPatch};
use crate::query::CompiledQuery;

pub mod migrator;
pub mod repositories;

pub use repositories::listing::ListingPage;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn listing_repo(&self) -> repositories::listing::ListingRepository {
        repositories::listing::ListingRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    /// Cache backend persisted next to the listings, used as the backing
    /// store for the search result cache.
    #[must_use]
    pub fn cache_backend(&self) -> Arc<dyn CacheBackend> {
        Arc::new(repositories::cache::CacheRepository::new(self.conn.clone()))
    }

    pub async fn search_listings(&self, query: &CompiledQuery) -> Result<ListingPage> {
        self.listing_repo().search_page(query).await
    }

    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        self.listing_repo().get(id).await
    }

    pub async fn create_listing(&self, listing: &Listing) -> Result<()> {
        self.listing_repo().create(listing).await
    }

    pub async fn update_listing(&self, id: &str, patch: &ListingPatch) -> Result<Option<Listing>> {
        self.listing_repo().update(id, patch).await
    }

    pub async fn delete_listing(&self, id: &str) -> Result<bool> {
        self.listing_repo().delete(id).await
    }

    pub async fn listing_count(&self) -> Result<u64> {
        self.listing_repo().count().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        listed_by: crate::models::listing::ListedBy,
    ) -> Result<User> {
        self.user_repo().create(username, password, listed_by).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }
}
