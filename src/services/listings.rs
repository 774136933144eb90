//! Domain service for listing search and mutation.
//!
//! Search runs through the read-through cache; mutations go straight to the
//! store and invalidate the whole search namespace on success, so the next
//! search of any parameter combination sees fresh data.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::SearchCache;
use crate::db::{ListingPage, Store};
use crate::models::listing::{
    Category, Furnishing, Listing, ListingKind, ListingPatch, ListedBy,
};
use crate::query::{self, CompileError, SEARCH_KEY_PREFIX};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Listing {0} belongs to a different publisher role")]
    Forbidden(String),

    #[error(transparent)]
    InvalidQuery(#[from] CompileError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ListingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Fields the client supplies when publishing a listing. The id, timestamps
/// and publisher role are assigned server-side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub price: f64,
    pub state: String,
    pub city: String,
    pub area_sq_ft: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub amenities: String,
    pub furnished: Furnishing,
    pub available_from: String,
    pub tags: String,
    pub color_theme: String,
    pub rating: f32,
    pub is_verified: bool,
    pub listing_type: ListingKind,
}

#[derive(Clone)]
pub struct ListingService {
    store: Store,
    cache: SearchCache,
    cache_ttl: Duration,
}

impl ListingService {
    #[must_use]
    pub const fn new(store: Store, cache: SearchCache, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Compile the raw parameters, derive the cache key and serve the page
    /// through the read-through cache.
    pub async fn search(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<ListingPage, ListingError> {
        let compiled = query::compile(params)?;
        let key = query::encode(&compiled);

        let page = self
            .cache
            .get_or_load(&key, self.cache_ttl, || async {
                self.store.search_listings(&compiled).await
            })
            .await?;

        Ok(page)
    }

    pub async fn get(&self, id: &str) -> Result<Listing, ListingError> {
        self.store
            .get_listing(id)
            .await?
            .ok_or_else(|| ListingError::NotFound(id.to_string()))
    }

    pub async fn create(
        &self,
        draft: ListingDraft,
        publisher: ListedBy,
    ) -> Result<Listing, ListingError> {
        let now = chrono::Utc::now().to_rfc3339();
        let listing = Listing {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            category: draft.category,
            price: draft.price,
            state: draft.state,
            city: draft.city,
            area_sq_ft: draft.area_sq_ft,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            amenities: draft.amenities,
            furnished: draft.furnished,
            available_from: draft.available_from,
            listed_by: publisher,
            tags: draft.tags,
            color_theme: draft.color_theme,
            rating: draft.rating,
            is_verified: draft.is_verified,
            listing_type: draft.listing_type,
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.create_listing(&listing).await?;
        self.cache.invalidate_prefix(SEARCH_KEY_PREFIX).await;

        Ok(listing)
    }

    /// Patch a listing. The caller's role must match the role the listing
    /// was published under; the check runs before any write.
    pub async fn update(
        &self,
        id: &str,
        patch: &ListingPatch,
        caller: ListedBy,
    ) -> Result<Listing, ListingError> {
        self.authorize(id, caller).await?;

        let updated = self
            .store
            .update_listing(id, patch)
            .await?
            .ok_or_else(|| ListingError::NotFound(id.to_string()))?;

        self.cache.invalidate_prefix(SEARCH_KEY_PREFIX).await;

        Ok(updated)
    }

    pub async fn delete(&self, id: &str, caller: ListedBy) -> Result<(), ListingError> {
        self.authorize(id, caller).await?;

        if !self.store.delete_listing(id).await? {
            return Err(ListingError::NotFound(id.to_string()));
        }

        self.cache.invalidate_prefix(SEARCH_KEY_PREFIX).await;

        Ok(())
    }

    async fn authorize(&self, id: &str, caller: ListedBy) -> Result<(), ListingError> {
        let existing = self.get(id).await?;
        if existing.listed_by != caller {
            return Err(ListingError::Forbidden(id.to_string()));
        }
        Ok(())
    }
}
