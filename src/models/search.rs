//! Request and result shapes of the search endpoint.

use serde::{Deserialize, Serialize};

use super::Place;
use crate::error::{Result, SearchError};

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Search request posted to `/api/v1/nearme/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query point latitude, degrees
    pub latitude: f64,
    /// Query point longitude, degrees
    pub longitude: f64,
    /// Free text matched against place titles
    #[serde(default)]
    pub title: Option<String>,
    /// Tags every result must carry
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Zero-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size
    #[serde(default = "default_size")]
    pub size: u32,
}

impl SearchRequest {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            title: None,
            tags: None,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Reject coordinates outside WGS84 bounds and empty pages
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SearchError::invalid(format!(
                "latitude must be within [-90, 90], got {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SearchError::invalid(format!(
                "longitude must be within [-180, 180], got {}",
                self.longitude
            )));
        }
        if self.size == 0 {
            return Err(SearchError::invalid("size must be at least 1"));
        }
        Ok(())
    }

    /// Lowercased title terms, empty when there is no title criterion
    pub fn title_terms(&self) -> Vec<String> {
        self.title
            .as_deref()
            .map(|t| t.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default()
    }

    /// The title text when it is a real criterion (present and not blank)
    pub fn title_query(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Lowercased, non-blank, de-duplicated tag filter
    pub fn tag_filter(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.iter().flatten() {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Number of results skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One place in a result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Option<i64>,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: Vec<String>,
    /// Great-circle distance from the query point, meters
    pub distance: f64,
}

impl SearchResult {
    pub fn from_place(place: &Place, distance: f64) -> Self {
        Self {
            id: Some(place.id),
            title: place.title.clone(),
            latitude: place.location.lat,
            longitude: place.location.lon,
            tags: place.tags.clone(),
            distance,
        }
    }
}
