//! Elasticsearch client and operations.

mod bulk;
mod client;
mod schema;

pub use bulk::{bulk_lines, BulkIndexer, BulkStats};
pub use client::EsClient;
pub use schema::{create_index, places_mapping};
