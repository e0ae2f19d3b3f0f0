//! Server configuration loaded from an optional TOML file.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:3000"
//! max_page_size = 100
//!
//! [search]
//! backend = "memory"
//! seed_file = "data/places.jsonl"
//! max_distance_km = 25.0
//!
//! [elasticsearch]
//! url = "http://localhost:9200"
//! index = "places"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Which search backend the server delegates to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Elasticsearch,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub elasticsearch: ElasticsearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Larger requested page sizes are clamped to this
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SearchConfig {
    pub backend: Backend,
    /// Places farther than this from the query point are never returned
    pub max_distance_km: Option<f64>,
    /// JSON-lines file loaded by the memory backend
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub index: String,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "places".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_page_size == 0 {
            anyhow::bail!("server.max_page_size must be at least 1");
        }
        if let Some(km) = self.search.max_distance_km {
            if !km.is_finite() || km <= 0.0 {
                anyhow::bail!("search.max_distance_km must be positive, got {}", km);
            }
        }
        Ok(())
    }
}
