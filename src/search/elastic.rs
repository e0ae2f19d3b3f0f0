//! Search query building and execution against Elasticsearch.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{distance_meters, PlaceSearch};
use crate::elasticsearch::EsClient;
use crate::error::{Result, SearchError};
use crate::models::{GeoPoint, Page, Place, SearchRequest, SearchResult};

/// Place search backed by an Elasticsearch index
pub struct EsPlaceSearch {
    client: EsClient,
    /// Optional search radius in meters
    max_distance: Option<f64>,
}

impl EsPlaceSearch {
    pub fn new(client: EsClient) -> Self {
        Self {
            client,
            max_distance: None,
        }
    }

    /// Exclude places farther than `km` from the query point
    pub fn with_max_distance_km(mut self, km: Option<f64>) -> Self {
        self.max_distance = km.map(|km| km * 1000.0);
        self
    }
}

/// Default `index.max_result_window`; `from + size` may not exceed it
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// Whether the requested page reaches past what Elasticsearch will page through
pub fn exceeds_result_window(request: &SearchRequest) -> bool {
    request.offset() + u64::from(request.size) > MAX_RESULT_WINDOW
}

/// Build the search body for a request.
///
/// Pages beyond the result window become a count-only query (`size: 0`), so
/// the response carries the totals and an empty page.
pub fn build_query(request: &SearchRequest, max_distance: Option<f64>) -> Value {
    let origin = json!({ "lat": request.latitude, "lon": request.longitude });

    let mut filters: Vec<Value> = request
        .tag_filter()
        .into_iter()
        .map(|tag| json!({ "term": { "tags": tag } }))
        .collect();

    if let Some(radius) = max_distance {
        filters.push(json!({
            "geo_distance": {
                "distance": format!("{}m", radius),
                "location": origin.clone()
            }
        }));
    }

    let must = match request.title_query() {
        Some(title) => json!([{
            "match": {
                "title": {
                    "query": title,
                    "operator": "and"
                }
            }
        }]),
        None => json!([{ "match_all": {} }]),
    };

    let query = json!({
        "bool": {
            "must": must,
            "filter": filters
        }
    });

    if exceeds_result_window(request) {
        return json!({
            "query": query,
            "size": 0,
            "track_total_hits": true
        });
    }

    json!({
        "query": query,
        "sort": [
            {
                "_geo_distance": {
                    "location": origin,
                    "order": "asc",
                    "unit": "m",
                    "distance_type": "arc"
                }
            },
            { "id": "asc" }
        ],
        "from": request.offset(),
        "size": request.size,
        "track_total_hits": true
    })
}

/// Turn a search response body into a result page.
///
/// Hits whose `_source` cannot be read are skipped with a warning.
pub fn parse_response(body: &Value, request: &SearchRequest) -> Result<Page<SearchResult>> {
    let hits = body["hits"]["hits"]
        .as_array()
        .ok_or_else(|| SearchError::Parse {
            reason: "response has no hits array".to_string(),
        })?;

    let origin = GeoPoint::new(request.latitude, request.longitude);

    let content: Vec<SearchResult> = hits.iter().filter_map(|hit| parse_hit(hit, origin)).collect();

    let total = body["hits"]["total"]["value"]
        .as_u64()
        .unwrap_or_else(|| request.offset() + hits.len() as u64);

    Ok(Page::new(content, request.page, request.size, total))
}

/// Parse an Elasticsearch hit into a SearchResult
fn parse_hit(hit: &Value, origin: GeoPoint) -> Option<SearchResult> {
    let place: Place = match serde_json::from_value(hit["_source"].clone()) {
        Ok(place) => place,
        Err(e) => {
            warn!("Skipping unreadable hit {}: {}", hit["_id"], e);
            return None;
        }
    };

    // The first sort value is the _geo_distance in meters
    let distance = hit["sort"][0]
        .as_f64()
        .unwrap_or_else(|| distance_meters(origin, place.location));

    Some(SearchResult::from_place(&place, distance))
}

#[async_trait]
impl PlaceSearch for EsPlaceSearch {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Page<SearchResult>> {
        if exceeds_result_window(request) {
            debug!(
                "Page {} of size {} is past the result window, counting only",
                request.page, request.size
            );
        }
        let body = build_query(request, self.max_distance);

        debug!("Search query: {}", body);

        let response = self
            .client
            .client()
            .search(elasticsearch::SearchParts::Index(&[&self.client.index_name]))
            .body(body)
            .send()
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await?;
            return Err(SearchError::Backend {
                reason: format!("search returned {}: {}", status, error_body),
            });
        }

        let response_body = response.json::<Value>().await?;
        parse_response(&response_body, request)
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await.map_err(SearchError::backend)
    }
}
