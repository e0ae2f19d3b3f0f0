//! HTTP API: routes and shared state.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::search::PlaceSearch;

pub mod handlers;

pub const SEARCH_ROUTE: &str = "/api/v1/nearme/search";

/// Application state shared across handlers
pub struct AppState {
    pub search: Arc<dyn PlaceSearch>,
    pub max_page_size: u32,
}

impl AppState {
    pub fn new(search: Arc<dyn PlaceSearch>, max_page_size: u32) -> Self {
        Self {
            search,
            max_page_size: max_page_size.max(1),
        }
    }
}

/// Build the router with all routes and layers
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(SEARCH_ROUTE, post(handlers::search_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
