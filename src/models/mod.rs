//! Core data models for place search.

pub mod page;
pub mod place;
pub mod search;

pub use page::Page;
pub use place::{GeoPoint, Place, PlaceRecord};
pub use search::{SearchRequest, SearchResult, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
