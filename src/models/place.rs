//! Place document structure for Elasticsearch indexing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Convert to a `geo` point (x = lon, y = lat)
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// Flat place record as it appears in seed and ingest files.
///
/// One JSON object per line:
/// `{"id": 1, "title": "Blue Bottle", "latitude": 37.77, "longitude": -122.42, "tags": ["coffee"]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: i64,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Place document indexed into Elasticsearch and held by the in-memory index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Place identifier, also used as the document `_id`
    pub id: i64,

    pub title: String,

    /// Location for geospatial queries
    pub location: GeoPoint,

    /// Descriptive tags (e.g., ["wifi", "coffee"])
    #[serde(default)]
    pub tags: Vec<String>,

    /// Import timestamp for refresh tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_timestamp: Option<DateTime<Utc>>,
}

impl Place {
    /// Create a new place without tags
    pub fn new(id: i64, title: &str, location: GeoPoint) -> Self {
        Self {
            id,
            title: title.to_string(),
            location,
            tags: Vec::new(),
            import_timestamp: None,
        }
    }

    /// Add a tag, skipping blanks and duplicates
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return;
        }
        self.tags.push(tag.to_string());
    }

    /// Whether the place carries `tag`, ignoring case (Unicode lowercasing)
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    /// Whether every term occurs somewhere in the title, ignoring case.
    /// Terms are expected to be lowercase already.
    pub fn title_matches(&self, terms: &[String]) -> bool {
        let title = self.title.to_lowercase();
        terms.iter().all(|term| title.contains(term.as_str()))
    }
}

impl From<PlaceRecord> for Place {
    fn from(record: PlaceRecord) -> Self {
        let mut place = Place::new(
            record.id,
            &record.title,
            GeoPoint::new(record.latitude, record.longitude),
        );
        for tag in &record.tags {
            place.add_tag(tag);
        }
        place.import_timestamp = Some(Utc::now());
        place
    }
}
