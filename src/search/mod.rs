//! Place search backends.
//!
//! The HTTP layer only knows the [`PlaceSearch`] trait. Two backends implement it:
//! an Elasticsearch index for production and an R-tree held in memory for
//! local runs and tests. Both share the same semantics: optional title terms,
//! an all-of tag filter, ordering by great-circle distance (ties by id) and
//! `page`/`size` paging.

mod elastic;
mod memory;

use async_trait::async_trait;
use geo::{Distance, Haversine};

use crate::error::Result;
use crate::models::{GeoPoint, Page, SearchRequest, SearchResult};

pub use elastic::{build_query, parse_response, EsPlaceSearch};
pub use memory::MemoryPlaceSearch;

/// Mean earth radius in meters, as used by `geo::Haversine`
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A search backend the endpoint delegates to.
///
/// Title matching is backend specific. The in-memory index matches each
/// lowercased term as a substring of the title (`"coffee ro"` finds
/// "Coffee Roasters"). Elasticsearch runs an analyzed `match` with
/// `operator: and`, which matches whole tokens and folds accents. Tag
/// filtering, ordering and paging behave the same on both.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn name(&self) -> &'static str;

    /// Run one search and return the requested page.
    ///
    /// # Errors
    /// - `SearchError::Backend` - backend unreachable or returned an error
    /// - `SearchError::Parse` - backend response could not be read
    async fn search(&self, request: &SearchRequest) -> Result<Page<SearchResult>>;

    /// Whether the backend is able to serve searches
    async fn health_check(&self) -> Result<bool>;
}

/// Great-circle distance in meters
pub fn distance_meters(from: GeoPoint, to: GeoPoint) -> f64 {
    Haversine.distance(from.to_point(), to.to_point())
}
