//! Elasticsearch client wrapper.

use anyhow::{Context, Result};
use elasticsearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::IndicesRefreshParts,
    CountParts, Elasticsearch,
};
use url::Url;

/// Elasticsearch client bound to the places index
#[derive(Clone)]
pub struct EsClient {
    client: Elasticsearch,
    pub index_name: String,
}

impl EsClient {
    /// Create a new client for `es_url` targeting `index_name`
    pub fn new(es_url: &str, index_name: &str) -> Result<Self> {
        let url = Url::parse(es_url).with_context(|| format!("Invalid Elasticsearch URL: {}", es_url))?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            index_name: index_name.to_string(),
        })
    }

    /// Get the underlying Elasticsearch client
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Check if cluster is healthy
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await?;

        Ok(response.status_code().is_success())
    }

    /// Get document count in index
    pub async fn doc_count(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountParts::Index(&[&self.index_name]))
            .send()
            .await?;

        let body = response.json::<serde_json::Value>().await?;
        Ok(body["count"].as_u64().unwrap_or(0))
    }

    /// Make recently indexed documents visible to searches
    pub async fn refresh(&self) -> Result<()> {
        self.client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[&self.index_name]))
            .send()
            .await
            .context("Failed to refresh index")?;
        Ok(())
    }
}
