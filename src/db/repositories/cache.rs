use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::entities::{prelude::*, search_cache};

/// Cache backend persisted in the `search_cache` table. Entries carry an
/// absolute expiry timestamp so reads can filter out stale rows even before
/// anything deletes them.
pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheBackend for CacheRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = chrono::Utc::now().to_rfc3339();

        // Cleanup expired entries first (opportunistic cleanup)
        // Ideally this would be a background job, but this is simple.
        let _ = SearchCacheEntity::delete_many()
            .filter(search_cache::Column::ExpiresAt.lt(&now))
            .exec(&self.conn)
            .await;

        let entry = SearchCacheEntity::find()
            .filter(search_cache::Column::CacheKey.eq(key))
            .filter(search_cache::Column::ExpiresAt.gt(&now))
            .one(&self.conn)
            .await?;

        Ok(entry.map(|e| e.payload_json))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = chrono::Utc::now();
        let expires_at = (now + chrono::Duration::from_std(ttl)?).to_rfc3339();

        // Delete-then-insert rather than upsert: keeps created_at honest and
        // sidesteps conflict handling on the unique key.
        let _ = SearchCacheEntity::delete_many()
            .filter(search_cache::Column::CacheKey.eq(key))
            .exec(&self.conn)
            .await;

        let active_model = search_cache::ActiveModel {
            cache_key: Set(key.to_string()),
            payload_json: Set(value.to_string()),
            created_at: Set(now.to_rfc3339()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        SearchCacheEntity::insert(active_model)
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let result = SearchCacheEntity::delete_many()
            .filter(search_cache::Column::CacheKey.starts_with(prefix))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
