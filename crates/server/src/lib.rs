//! Decoupage Server - read-only HTTP API over French administrative divisions
//!
//! Serves communes, departements and regions from an immutable snapshot
//! loaded at startup. Filtering, fuzzy name search, field projection and
//! GeoJSON output are all done by [`decoupage::GeoEngine`]; this crate maps
//! URLs and query strings onto it and engine errors onto status codes.
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
//! - `GET /health` - Liveness probe with dataset counts
//! - `GET /communes` - Filter communes (`code`, `nom`, `codePostal`,
//!   `codeDepartement`, `codeRegion`, `limit`, `fields`, `format`)
//! - `GET /communes/{code}` - One commune
//! - `GET /departements` - All departements, or filtered (`code`, `nom`,
//!   `codeRegion`)
//! - `GET /departements/{code}` - One departement
//! - `GET /departements/{code}/communes` - Communes of a departement
//! - `GET /regions` - All regions, or filtered (`code`, `nom`)
//! - `GET /regions/{code}` - One region
//! - `GET /regions/{code}/departements` - Departements of a region
//!
//! `limit` and `fields` apply to every listing, hierarchy listings included.
//!
//! Errors use `{"error": {"code": ..., "message": ...}}` with 400 for
//! invalid requests and 404 for unknown codes.

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
