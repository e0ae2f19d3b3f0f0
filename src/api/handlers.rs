use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::SearchError;
use crate::models::{Page, SearchRequest, SearchResult};

/// Place search near a point
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<SearchRequest>,
) -> Result<Json<Page<SearchResult>>, SearchError> {
    request.validate()?;

    if request.size > state.max_page_size {
        debug!(
            "Clamping page size {} to {}",
            request.size, state.max_page_size
        );
        request.size = state.max_page_size;
    }

    let start = Instant::now();
    let page = state.search.search(&request).await?;

    info!(
        "Search ({}, {}) page {} returned {} of {} places in {}ms",
        request.latitude,
        request.longitude,
        request.page,
        page.number_of_elements,
        page.total_elements,
        start.elapsed().as_millis()
    );

    Ok(Json(page))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let healthy = match state.search.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!("Health check failed: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        backend: state.search.name(),
    })
}
