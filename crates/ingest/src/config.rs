//! Configuration types for snapshot loading.
//!
//! [`IngestConfig`] says where the three dataset files live and how strictly
//! their records are sanitized. It is cheap to clone and deserializable from
//! JSON, TOML or YAML.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::with_data_dir("data");
//! config.validate().expect("valid configuration");
//! assert_eq!(config.regions_path(), std::path::Path::new("data/regions.json"));
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for snapshot loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Configuration version. Must be >= 1.
    pub version: u32,

    /// Directory holding the dataset files.
    pub data_dir: PathBuf,

    /// File names, relative to `data_dir`.
    pub regions_file: String,
    pub departements_file: String,
    pub communes_file: String,

    /// Refuse files larger than this many bytes.
    #[serde(default)]
    pub max_file_bytes: Option<u64>,

    /// Remove control characters from codes and names before trimming.
    #[serde(default = "default_true")]
    pub strip_control_chars: bool,
}

fn default_true() -> bool {
    true
}

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config version must be >= 1")]
    InvalidVersion,

    #[error("{0} must not be empty")]
    EmptyFileName(&'static str),

    #[error("max_file_bytes must be greater than zero")]
    ZeroFileLimit,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl IngestConfig {
    /// Default file names under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: 1,
            data_dir: data_dir.into(),
            regions_file: "regions.json".into(),
            departements_file: "departements.json".into(),
            communes_file: "communes.json".into(),
            max_file_bytes: None,
            strip_control_chars: true,
        }
    }

    pub fn regions_path(&self) -> PathBuf {
        self.data_dir.join(&self.regions_file)
    }

    pub fn departements_path(&self) -> PathBuf {
        self.data_dir.join(&self.departements_file)
    }

    pub fn communes_path(&self) -> PathBuf {
        self.data_dir.join(&self.communes_file)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }
        for (name, value) in [
            ("regions_file", &self.regions_file),
            ("departements_file", &self.departements_file),
            ("communes_file", &self.communes_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyFileName(name));
            }
        }
        if self.max_file_bytes == Some(0) {
            return Err(ConfigError::ZeroFileLimit);
        }

        Ok(())
    }
}
