//! Snapshot ingest layer.
//!
//! This is where the dataset enters the system. We read the three JSON array
//! files (regions, departements, communes), sanitize every record and hand back
//! a [`Snapshot`] the index can be built from.
//!
//! ## What we do here
//!
//! - **Read and bound** the dataset files (`max_file_bytes`)
//! - **Parse** them into typed records ([`Region`], [`Departement`], [`Commune`])
//! - **Sanitize** codes and names (control characters, surrounding whitespace)
//! - **Validate** record-local invariants: non-empty codes and names, non-empty
//!   postal code lists, point centres, areal contours, positive surfaces
//! - **Log** outcomes via tracing
//!
//! Cross-record invariants (unique codes, resolvable foreign keys) belong to
//! the index build, which sees the whole snapshot at once.
//!
//! ## Example
//!
//! ```
//! use ingest::{parse_snapshot, IngestConfig};
//!
//! let snapshot = parse_snapshot(
//!     r#"[{"code": "28", "nom": "Normandie"}]"#,
//!     r#"[{"code": "27", "nom": "Eure", "codeRegion": "28"}]"#,
//!     "[]",
//!     &IngestConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(snapshot.regions[0].nom, "Normandie");
//! assert_eq!(snapshot.departements[0].code_region, "28");
//! ```

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{info, warn, Level};

mod config;
mod error;
mod record;
mod types;

use crate::record::{normalize_commune, normalize_departement, normalize_region};

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::types::{
    Commune, Departement, EntityKind, Geometry, Position, Region, Snapshot,
};

/// Load and validate the snapshot described by `cfg`.
pub fn load_snapshot(cfg: &IngestConfig) -> Result<Snapshot, IngestError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "ingest.load_snapshot",
        data_dir = %cfg.data_dir().display()
    );
    let _guard = span.enter();

    let result = cfg
        .validate()
        .map_err(IngestError::from)
        .and_then(|()| {
            let regions = read_file(&cfg.regions_path(), cfg.max_file_bytes)?;
            let departements = read_file(&cfg.departements_path(), cfg.max_file_bytes)?;
            let communes = read_file(&cfg.communes_path(), cfg.max_file_bytes)?;
            parse_snapshot(&regions, &departements, &communes, cfg)
        });

    let elapsed_micros = start.elapsed().as_micros();
    match &result {
        Ok(snapshot) => info!(
            regions = snapshot.regions.len(),
            departements = snapshot.departements.len(),
            communes = snapshot.communes.len(),
            elapsed_micros,
            "snapshot_loaded"
        ),
        Err(err) => warn!(error = %err, elapsed_micros, "snapshot_load_failure"),
    }
    result
}

/// Parse and validate a snapshot from in-memory JSON documents.
pub fn parse_snapshot(
    regions_json: &str,
    departements_json: &str,
    communes_json: &str,
    cfg: &IngestConfig,
) -> Result<Snapshot, IngestError> {
    let regions = parse_records::<Region>(&cfg.regions_file, regions_json)?
        .into_iter()
        .enumerate()
        .map(|(index, region)| normalize_region(index, region, cfg))
        .collect::<Result<Vec<_>, _>>()?;

    let departements = parse_records::<Departement>(&cfg.departements_file, departements_json)?
        .into_iter()
        .enumerate()
        .map(|(index, departement)| normalize_departement(index, departement, cfg))
        .collect::<Result<Vec<_>, _>>()?;

    let communes = parse_records::<Commune>(&cfg.communes_file, communes_json)?
        .into_iter()
        .enumerate()
        .map(|(index, commune)| normalize_commune(index, commune, cfg))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Snapshot {
        regions,
        departements,
        communes,
    })
}

fn parse_records<T: DeserializeOwned>(file: &str, json: &str) -> Result<Vec<T>, IngestError> {
    serde_json::from_str(json).map_err(|err| IngestError::Parse {
        file: file.to_string(),
        message: err.to_string(),
    })
}

fn read_file(path: &Path, limit: Option<u64>) -> Result<String, IngestError> {
    let io_error = |err: std::io::Error| IngestError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    };

    if let Some(limit) = limit {
        let len = fs::metadata(path).map_err(io_error)?.len();
        if len > limit {
            return Err(IngestError::FileTooLarge {
                path: path.display().to_string(),
                limit,
            });
        }
    }
    fs::read_to_string(path).map_err(io_error)
}
