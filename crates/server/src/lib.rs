//! ragcore server - HTTP REST API for the retrieval-augmented answering core.
//!
//! This crate exposes the ragcore pipeline over REST:
//!
//! - **Ingestion**: per-tenant document upserts
//! - **Query**: cache-fronted retrieval-augmented answering
//! - **Tenant management**: list documents, delete tenants and documents
//! - **Health**: liveness and readiness probes
//!
//! Every pipeline call runs on the shared blocking pool under a bounded
//! deadline so one tenant's rebuild cannot stall unrelated requests, and a
//! stuck embedding or generation call surfaces as a timeout instead of
//! hanging the connection.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `POST /api/v1/ingest` - Upsert documents for a tenant
//! - `POST /api/v1/query` - Answer a tenant query
//! - `GET /api/v1/tenants/{tenant}/documents` - List a tenant's documents
//! - `DELETE /api/v1/tenants/{tenant}` - Delete a tenant
//! - `DELETE /api/v1/tenants/{tenant}/documents/{doc_id}` - Delete one document

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
