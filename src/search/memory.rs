//! In-memory place search over an R-tree.

use async_trait::async_trait;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, info};

use super::{distance_meters, PlaceSearch, MEAN_EARTH_RADIUS_M};
use crate::error::Result;
use crate::models::{GeoPoint, Page, Place, SearchRequest, SearchResult};

/// Wrapper for R-tree indexing of places
struct IndexedPlace {
    place: Place,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPlace {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedPlace {
    fn new(place: Place) -> Self {
        let envelope = AABB::from_point([place.location.lon, place.location.lat]);
        Self { place, envelope }
    }
}

/// Place search held entirely in memory
pub struct MemoryPlaceSearch {
    tree: RTree<IndexedPlace>,
    /// Optional search radius in meters
    max_distance: Option<f64>,
}

impl MemoryPlaceSearch {
    /// Build the spatial index from places
    pub fn build(places: Vec<Place>) -> Self {
        info!("Building in-memory index for {} places...", places.len());

        let indexed: Vec<IndexedPlace> = places.into_iter().map(IndexedPlace::new).collect();
        let tree = RTree::bulk_load(indexed);

        info!("In-memory index built with {} entries", tree.size());
        Self {
            tree,
            max_distance: None,
        }
    }

    /// Exclude places farther than `km` from the query point
    pub fn with_max_distance_km(mut self, km: Option<f64>) -> Self {
        self.max_distance = km.map(|km| km * 1000.0);
        self
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Places that can lie within the radius, or every place without one
    fn candidates(&self, origin: GeoPoint) -> Vec<&IndexedPlace> {
        match self.max_distance {
            Some(radius) => {
                let envelope = search_envelope(origin, radius);
                self.tree
                    .locate_in_envelope_intersecting(&envelope)
                    .collect()
            }
            None => self.tree.iter().collect(),
        }
    }
}

/// Lon/lat box containing every point within `radius` meters of `origin`.
///
/// Falls back to the full longitude range near the poles and when the box
/// would cross the antimeridian.
fn search_envelope(origin: GeoPoint, radius: f64) -> AABB<[f64; 2]> {
    let angular = radius / MEAN_EARTH_RADIUS_M;
    let dlat = angular.to_degrees();
    let min_lat = origin.lat - dlat;
    let max_lat = origin.lat + dlat;

    let full_lon = (-180.0, 180.0);
    let (min_lon, max_lon) = if min_lat <= -90.0 || max_lat >= 90.0 {
        full_lon
    } else {
        let ratio = angular.sin() / origin.lat.to_radians().cos();
        if ratio >= 1.0 {
            full_lon
        } else {
            let dlon = ratio.asin().to_degrees();
            if origin.lon - dlon < -180.0 || origin.lon + dlon > 180.0 {
                full_lon
            } else {
                (origin.lon - dlon, origin.lon + dlon)
            }
        }
    };

    AABB::from_corners(
        [min_lon, min_lat.max(-90.0)],
        [max_lon, max_lat.min(90.0)],
    )
}

#[async_trait]
impl PlaceSearch for MemoryPlaceSearch {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Page<SearchResult>> {
        let origin = GeoPoint::new(request.latitude, request.longitude);
        let terms = request.title_terms();
        let tags = request.tag_filter();
        let max_distance = self.max_distance;

        let candidates = self.candidates(origin);
        let candidate_count = candidates.len();

        let mut hits: Vec<(f64, &Place)> = candidates
            .into_par_iter()
            .map(|ip| &ip.place)
            .filter(|place| place.title_matches(&terms))
            .filter(|place| tags.iter().all(|tag| place.has_tag(tag)))
            .map(|place| (distance_meters(origin, place.location), place))
            .filter(|(distance, _)| max_distance.is_none_or(|max| *distance <= max))
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));

        debug!(
            "Memory search at ({}, {}): {} candidates, {} matches",
            request.latitude,
            request.longitude,
            candidate_count,
            hits.len()
        );

        let total = hits.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = hits
            .into_iter()
            .skip(offset)
            .take(request.size as usize)
            .map(|(distance, place)| SearchResult::from_place(place, distance))
            .collect();

        Ok(Page::new(content, request.page, request.size, total))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: i64, title: &str, lat: f64, lon: f64, tags: &[&str]) -> Place {
        let mut place = Place::new(id, title, GeoPoint::new(lat, lon));
        for tag in tags {
            place.add_tag(tag);
        }
        place
    }

    /// A handful of places around downtown San Francisco
    fn fixture() -> MemoryPlaceSearch {
        MemoryPlaceSearch::build(vec![
            place(1, "Blue Bottle Coffee", 37.7763, -122.4232, &["coffee", "wifi"]),
            place(2, "Ritual Coffee Roasters", 37.7565, -122.4213, &["coffee"]),
            place(3, "Dolores Park", 37.7596, -122.4269, &["park", "outdoor"]),
            place(4, "Philz Coffee", 37.7645, -122.4225, &["Coffee", "WiFi"]),
            place(5, "Oakland Coffee Works", 37.8044, -122.2712, &["coffee", "wifi"]),
            place(6, "Sydney Opera House", -33.8568, 151.2153, &["landmark"]),
        ])
    }

    fn request() -> SearchRequest {
        SearchRequest::new(37.7749, -122.4194)
    }

    fn ids(page: &Page<SearchResult>) -> Vec<i64> {
        page.content.iter().filter_map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_orders_by_distance() {
        let index = fixture();
        let page = index.search(&request()).await.unwrap();

        assert_eq!(page.total_elements, 6);
        assert_eq!(ids(&page), vec![1, 4, 3, 2, 5, 6]);

        let distances: Vec<f64> = page.content.iter().map(|r| r.distance).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert!(distances[0] < 1_000.0);
    }

    #[tokio::test]
    async fn test_tags_must_all_match() {
        let index = fixture();
        let mut req = request();
        req.tags = Some(vec!["coffee".to_string(), "WIFI".to_string()]);

        let page = index.search(&req).await.unwrap();
        assert_eq!(ids(&page), vec![1, 4, 5]);
        // Tags are returned as stored
        assert_eq!(page.content[1].tags, vec!["Coffee", "WiFi"]);
    }

    #[tokio::test]
    async fn test_non_ascii_tag_matches_stored_tag() {
        let index = MemoryPlaceSearch::build(vec![
            place(1, "Plage de Nice", 43.6950, 7.2650, &["ÉTÉ", "plage"]),
            place(2, "Vieux Nice", 43.6970, 7.2760, &["hiver"]),
        ]);

        let mut req = SearchRequest::new(43.7, 7.27);
        req.tags = Some(vec!["ÉTÉ".to_string()]);
        let page = index.search(&req).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(ids(&page), vec![1]);

        req.tags = Some(vec!["été".to_string(), "Plage".to_string()]);
        let page = index.search(&req).await.unwrap();
        assert_eq!(ids(&page), vec![1]);
    }

    #[tokio::test]
    async fn test_title_terms() {
        let index = fixture();
        let mut req = request();
        req.title = Some("coffee ro".to_string());

        let page = index.search(&req).await.unwrap();
        assert_eq!(ids(&page), vec![2]);

        req.title = Some("  ".to_string());
        let page = index.search(&req).await.unwrap();
        assert_eq!(page.total_elements, 6);
    }

    #[tokio::test]
    async fn test_paging() {
        let index = fixture();
        let mut req = request();
        req.size = 4;

        let first = index.search(&req).await.unwrap();
        assert_eq!(ids(&first), vec![1, 4, 3, 2]);
        assert_eq!(first.total_pages, 2);
        assert!(first.first);
        assert!(!first.last);

        req.page = 1;
        let second = index.search(&req).await.unwrap();
        assert_eq!(ids(&second), vec![5, 6]);
        assert!(second.last);

        req.page = 9;
        let beyond = index.search(&req).await.unwrap();
        assert!(beyond.empty);
        assert_eq!(beyond.total_elements, 6);
    }

    #[tokio::test]
    async fn test_radius() {
        let index = fixture().with_max_distance_km(Some(5.0));
        let page = index.search(&request()).await.unwrap();
        assert_eq!(ids(&page), vec![1, 4, 3, 2]);
        assert!(page.content.iter().all(|r| r.distance <= 5_000.0));
    }

    #[tokio::test]
    async fn test_radius_across_antimeridian() {
        let index = MemoryPlaceSearch::build(vec![
            place(1, "East", 0.0, 179.99, &[]),
            place(2, "West", 0.0, -179.99, &[]),
            place(3, "Far", 0.0, 170.0, &[]),
        ])
        .with_max_distance_km(Some(10.0));

        let page = index.search(&SearchRequest::new(0.0, 179.995)).await.unwrap();
        assert_eq!(ids(&page), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_ties_break_by_id() {
        let index = MemoryPlaceSearch::build(vec![
            place(20, "Twin B", 10.0, 10.0, &[]),
            place(10, "Twin A", 10.0, 10.0, &[]),
        ]);
        let page = index.search(&SearchRequest::new(10.0, 10.0)).await.unwrap();
        assert_eq!(ids(&page), vec![10, 20]);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = MemoryPlaceSearch::build(vec![]);
        assert!(index.is_empty());
        let page = index.search(&request()).await.unwrap();
        assert!(page.empty);
        assert_eq!(page.total_pages, 0);
        assert!(index.health_check().await.unwrap());
    }

    #[test]
    fn test_envelope_near_pole_spans_all_longitudes() {
        let envelope = search_envelope(GeoPoint::new(89.99, 0.0), 5_000.0);
        assert_eq!(envelope.lower()[0], -180.0);
        assert_eq!(envelope.upper()[0], 180.0);
        assert_eq!(envelope.upper()[1], 90.0);
    }
}
