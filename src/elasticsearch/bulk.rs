//! Bulk indexing operations for Elasticsearch.

use anyhow::{Context, Result};
use elasticsearch::http::request::JsonBody;
use elasticsearch::BulkParts;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::EsClient;
use crate::models::Place;

/// Running totals of a bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkStats {
    pub indexed: usize,
    pub errors: usize,
}

/// Bulk indexer for efficient document insertion
pub struct BulkIndexer {
    client: EsClient,
    batch_size: usize,
    buffer: Vec<Place>,
    stats: BulkStats,
}

/// Action and document lines for one bulk request
pub fn bulk_lines(docs: &[Place]) -> Result<Vec<Value>> {
    let mut lines = Vec::with_capacity(docs.len() * 2);
    for doc in docs {
        lines.push(json!({ "index": { "_id": doc.id.to_string() } }));
        lines.push(serde_json::to_value(doc)?);
    }
    Ok(lines)
}

/// Count item failures in a bulk response, logging the first reason
fn count_item_errors(response_body: &Value) -> usize {
    if !response_body["errors"].as_bool().unwrap_or(false) {
        return 0;
    }

    let failed: Vec<&Value> = response_body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| item["index"]["error"].is_object())
                .collect()
        })
        .unwrap_or_default();

    if let Some(first) = failed.first() {
        warn!(
            "Bulk item {} failed: {}",
            first["index"]["_id"], first["index"]["error"]["reason"]
        );
    }

    failed.len()
}

impl BulkIndexer {
    /// Create a new bulk indexer
    pub fn new(client: EsClient, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            client,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            stats: BulkStats::default(),
        }
    }

    /// Add a document to the buffer, flushing if batch is full
    pub async fn add(&mut self, place: Place) -> Result<()> {
        self.buffer.push(place);

        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }

        Ok(())
    }

    /// Flush the buffer to Elasticsearch
    pub async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let docs = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        let count = docs.len();

        debug!("Flushing {} documents to Elasticsearch", count);

        let body: Vec<JsonBody<Value>> = bulk_lines(&docs)?.into_iter().map(JsonBody::from).collect();

        let response = self
            .client
            .client()
            .bulk(BulkParts::Index(&self.client.index_name))
            .body(body)
            .send()
            .await
            .context("Bulk request failed")?;

        if !response.status_code().is_success() {
            let status = response.status_code();
            let error_body = response.text().await?;
            anyhow::bail!("Bulk request returned {}: {}", status, error_body);
        }

        let response_body = response.json::<Value>().await?;
        let errors = count_item_errors(&response_body);
        if errors > 0 {
            warn!("Bulk request had {} errors out of {} documents", errors, count);
        }

        self.stats.indexed += count.saturating_sub(errors);
        self.stats.errors += errors;

        Ok(())
    }

    /// Finish indexing and return statistics
    pub async fn finish(mut self) -> Result<BulkStats> {
        self.flush().await?;
        Ok(self.stats)
    }
}
