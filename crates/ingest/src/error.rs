//! Error types produced while loading a snapshot.
//!
//! Every variant is fatal: a snapshot that fails to load never becomes
//! queryable, so there is no per-request recovery path for these errors.
//!
//! | Error | Description |
//! |-------|-------------|
//! | [`InvalidConfig`](IngestError::InvalidConfig) | The [`IngestConfig`](crate::IngestConfig) failed validation |
//! | [`Io`](IngestError::Io) | A dataset file could not be read |
//! | [`FileTooLarge`](IngestError::FileTooLarge) | A dataset file exceeds `max_file_bytes` |
//! | [`Parse`](IngestError::Parse) | A dataset file is not the expected JSON array |
//! | [`InvalidRecord`](IngestError::InvalidRecord) | A record violates a snapshot invariant |

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::EntityKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    #[error("invalid ingest config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("{path} exceeds size limit of {limit} bytes")]
    FileTooLarge { path: String, limit: u64 },

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// `index` is the record's position in its source file.
    #[error("invalid {kind} record #{index}: {reason}")]
    InvalidRecord {
        kind: EntityKind,
        index: usize,
        reason: String,
    },
}

impl IngestError {
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            IngestError::InvalidRecord { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
