//! nearme - "places near me" search service
//!
//! This library provides shared types and modules for the query and ingest binaries.

pub mod api;
pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod loader;
pub mod models;
pub mod search;

pub use error::SearchError;
pub use models::{GeoPoint, Page, Place, SearchRequest, SearchResult};
pub use search::PlaceSearch;
