use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, SearchResponseDto, validation};
use crate::models::listing::{Listing, ListingPatch};
use crate::services::ListingDraft;

/// GET /api/listings
///
/// Public search endpoint. Every parameter combination is compiled, keyed
/// and served through the search cache.
pub async fn search_listings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<SearchResponseDto>>, ApiError> {
    let page = state.listings().search(&params).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

/// GET /api/listings/{id}
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Listing>>, ApiError> {
    let listing = state.listings().get(&id).await?;
    Ok(Json(ApiResponse::success(listing)))
}

/// POST /api/listings
///
/// The listing is published under the caller's role; clients cannot publish
/// on behalf of another role.
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<ListingDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Listing>>), ApiError> {
    let Json(draft) = payload?;
    validation::validate_draft(&draft)?;

    let listing = state.listings().create(draft, user.listed_by).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(listing))))
}

/// PATCH /api/listings/{id}
pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<ListingPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<Listing>>, ApiError> {
    let Json(patch) = payload?;
    validation::validate_patch(&patch)?;

    let listing = state
        .listings()
        .update(&id, &patch, user.listed_by)
        .await?;

    Ok(Json(ApiResponse::success(listing)))
}

/// DELETE /api/listings/{id}
pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    state.listings().delete(&id, user.listed_by).await?;
    Ok(Json(ApiResponse::success(format!("Listing {id} deleted"))))
}
