//! Place ingest pipeline.
//!
//! Reads a JSON-lines file of places and indexes it into Elasticsearch.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nearme::elasticsearch::{create_index, BulkIndexer, EsClient};
use nearme::loader::parse_line;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Ingest JSON-lines places into Elasticsearch")]
struct Args {
    /// JSON-lines file, one place per line
    #[arg(short, long)]
    file: PathBuf,

    /// Elasticsearch URL
    #[arg(long, default_value = "http://localhost:9200")]
    es_url: String,

    /// Elasticsearch index name
    #[arg(long, default_value = "places")]
    index: String,

    /// Create the index if it does not exist
    #[arg(long)]
    create_index: bool,

    /// Delete and recreate the index before import
    #[arg(long)]
    recreate_index: bool,

    /// Delete places missing from this import
    #[arg(long)]
    refresh: bool,

    /// Batch size for bulk indexing
    #[arg(long, default_value = "5000")]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("nearme ingest");
    info!("File: {}", args.file.display());

    let es_client = EsClient::new(&args.es_url, &args.index)
        .context("Failed to connect to Elasticsearch")?;

    if !es_client.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }
    info!("Connected to Elasticsearch");

    if args.create_index || args.recreate_index {
        create_index(&es_client, args.recreate_index).await?;
    }

    let import_start = Utc::now();

    // First pass: count lines for the progress bar
    let total_lines = BufReader::new(
        File::open(&args.file).with_context(|| format!("Failed to open {}", args.file.display()))?,
    )
    .lines()
    .count() as u64;

    let pb = ProgressBar::new(total_lines);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut indexer = BulkIndexer::new(es_client.clone(), args.batch_size);
    let mut skipped = 0usize;

    let reader = BufReader::new(File::open(&args.file)?);
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        pb.inc(1);

        match parse_line(&line) {
            Ok(Some(mut place)) => {
                place.import_timestamp = Some(import_start);
                indexer.add(place).await?;
            }
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                pb.suspend(|| warn!("Skipping line {}: {}", number + 1, e));
            }
        }
    }

    pb.finish_with_message("Processing complete");

    let stats = indexer.finish().await?;
    info!(
        "Indexed {} documents ({} errors, {} lines skipped)",
        stats.indexed, stats.errors, skipped
    );

    es_client.refresh().await?;

    if args.refresh {
        info!("Deleting stale documents from previous import...");
        delete_stale_documents(&es_client, import_start).await?;
    }

    let doc_count = es_client.doc_count().await?;
    info!("Total documents in index: {}", doc_count);

    Ok(())
}

/// Delete documents not touched by the import that started at `import_start`
async fn delete_stale_documents(client: &EsClient, import_start: DateTime<Utc>) -> Result<()> {
    let query = serde_json::json!({
        "query": {
            "bool": {
                "should": [
                    { "range": { "import_timestamp": { "lt": import_start.to_rfc3339() } } },
                    { "bool": { "must_not": { "exists": { "field": "import_timestamp" } } } }
                ],
                "minimum_should_match": 1
            }
        }
    });

    let response = client
        .client()
        .delete_by_query(elasticsearch::DeleteByQueryParts::Index(&[
            &client.index_name
        ]))
        .body(query)
        .send()
        .await?;

    let body = response.json::<serde_json::Value>().await?;
    let deleted = body["deleted"].as_u64().unwrap_or(0);

    info!("Deleted {} stale documents", deleted);

    Ok(())
}
