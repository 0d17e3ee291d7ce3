//! ragcore Server - HTTP REST API for the retrieval-augmented answering core
//!
//! This binary exposes tenant-scoped ingestion, cache-fronted query
//! answering, and tenant management over REST.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
