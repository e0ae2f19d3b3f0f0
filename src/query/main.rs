//! Query server for place searches near a point.
//!
//! Serves `POST /api/v1/nearme/search` from either an Elasticsearch index or
//! an in-memory index loaded from a JSON-lines seed file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nearme::api::{self, AppState};
use nearme::config::{Backend, Config};
use nearme::elasticsearch::EsClient;
use nearme::loader::load_places;
use nearme::search::{EsPlaceSearch, MemoryPlaceSearch, PlaceSearch};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Place search server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Search backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Elasticsearch URL
    #[arg(long)]
    es_url: Option<String>,

    /// Elasticsearch index name
    #[arg(long)]
    index: Option<String>,

    /// JSON-lines places file for the memory backend
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Only return places within this many kilometers
    #[arg(long)]
    max_distance_km: Option<f64>,

    /// Upper bound for the requested page size
    #[arg(long)]
    max_page_size: Option<u32>,
}

impl Args {
    /// Load the config file if given and apply command line overrides
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(max_page_size) = self.max_page_size {
            config.server.max_page_size = max_page_size;
        }
        if let Some(backend) = self.backend {
            config.search.backend = backend;
        }
        if let Some(seed_file) = self.seed_file {
            config.search.seed_file = Some(seed_file);
        }
        if let Some(km) = self.max_distance_km {
            config.search.max_distance_km = Some(km);
        }
        if let Some(es_url) = self.es_url {
            config.elasticsearch.url = es_url;
        }
        if let Some(index) = self.index {
            config.elasticsearch.index = index;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;

    info!("nearme query server");

    let search = build_backend(&config).await?;
    let state = Arc::new(AppState::new(search, config.server.max_page_size));
    let app = api::router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_backend(config: &Config) -> Result<Arc<dyn PlaceSearch>> {
    let max_distance_km = config.search.max_distance_km;

    match config.search.backend {
        Backend::Elasticsearch => {
            let es = &config.elasticsearch;
            info!("Connecting to Elasticsearch at {}", es.url);

            let es_client = EsClient::new(&es.url, &es.index)?;
            if !es_client.health_check().await? {
                anyhow::bail!("Elasticsearch cluster is not healthy");
            }

            let doc_count = es_client.doc_count().await?;
            info!(
                "Connected to index '{}' with {} documents",
                es.index, doc_count
            );

            Ok(Arc::new(
                EsPlaceSearch::new(es_client).with_max_distance_km(max_distance_km),
            ))
        }
        Backend::Memory => {
            let places = match &config.search.seed_file {
                Some(path) => {
                    info!("Loading places from {}", path.display());
                    let loaded = load_places(path)
                        .with_context(|| format!("Failed to load {}", path.display()))?;
                    if loaded.skipped > 0 {
                        warn!("Skipped {} malformed lines", loaded.skipped);
                    }
                    loaded.places
                }
                None => {
                    warn!("No seed file configured, serving an empty index");
                    Vec::new()
                }
            };

            Ok(Arc::new(
                MemoryPlaceSearch::build(places).with_max_distance_km(max_distance_km),
            ))
        }
    }
}
