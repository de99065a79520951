//! YAML configuration file support.
//!
//! One file describes every stage of the engine: where the dataset lives, how
//! names are folded and how the matcher ranks them. Every section is optional
//! and falls back to the stage defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "production"
//!
//! data:
//!   data_dir: "/var/lib/decoupage"
//!   regions_file: "regions.json"
//!   departements_file: "departements.json"
//!   communes_file: "communes.json"
//!   max_file_bytes: 536870912
//!   strip_control_chars: true
//!
//! canonical:
//!   version: 1
//!   fold_diacritics: true
//!   strip_punctuation: true
//!   lowercase: true
//!
//! matcher:
//!   min_similarity: 0.85
//!   max_results: 500
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use canonical::CanonicalizeConfig;
use ingest::IngestConfig;
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DecoupageConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Dataset location and loading limits
    #[serde(default)]
    pub data: DataYamlConfig,

    /// Name folding rules
    #[serde(default)]
    pub canonical: CanonicalYamlConfig,

    /// Ranking and result limits
    #[serde(default)]
    pub matcher: MatchYamlConfig,
}

impl DecoupageConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DecoupageConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.data.validate()?;
        self.canonical.validate()?;
        self.matcher.validate()?;
        Ok(())
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            version: 1,
            data_dir: self.data.data_dir.clone(),
            regions_file: self.data.regions_file.clone(),
            departements_file: self.data.departements_file.clone(),
            communes_file: self.data.communes_file.clone(),
            max_file_bytes: self.data.max_file_bytes,
            strip_control_chars: self.data.strip_control_chars,
        }
    }

    pub fn canonical_config(&self) -> CanonicalizeConfig {
        CanonicalizeConfig {
            version: self.canonical.version,
            fold_diacritics: self.canonical.fold_diacritics,
            strip_punctuation: self.canonical.strip_punctuation,
            lowercase: self.canonical.lowercase,
        }
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            version: format!("v{}", self.matcher.version),
            min_similarity: self.matcher.min_similarity,
            max_results: self.matcher.max_results,
        }
    }

    /// Replace the dataset directory, keeping file names and limits.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data.data_dir = data_dir.into();
        self
    }
}

impl Default for DecoupageConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            data: DataYamlConfig::default(),
            canonical: CanonicalYamlConfig::default(),
            matcher: MatchYamlConfig::default(),
        }
    }
}

/// Dataset YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataYamlConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_regions_file")]
    pub regions_file: String,
    #[serde(default = "default_departements_file")]
    pub departements_file: String,
    #[serde(default = "default_communes_file")]
    pub communes_file: String,
    #[serde(default)]
    pub max_file_bytes: Option<u64>,
    #[serde(default = "true_value")]
    pub strip_control_chars: bool,
}

impl DataYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        for (field, value) in [
            ("data.regions_file", &self.regions_file),
            ("data.departements_file", &self.departements_file),
            ("data.communes_file", &self.communes_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigLoadError::Validation(format!(
                    "{field} must not be empty"
                )));
            }
        }
        if self.max_file_bytes == Some(0) {
            return Err(ConfigLoadError::Validation(
                "data.max_file_bytes must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DataYamlConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            regions_file: default_regions_file(),
            departements_file: default_departements_file(),
            communes_file: default_communes_file(),
            max_file_bytes: None,
            strip_control_chars: true,
        }
    }
}

/// Name folding YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "true_value")]
    pub fold_diacritics: bool,
    #[serde(default = "true_value")]
    pub strip_punctuation: bool,
    #[serde(default = "true_value")]
    pub lowercase: bool,
}

impl CanonicalYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "canonical.version must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CanonicalYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            fold_diacritics: true,
            strip_punctuation: true,
            lowercase: true,
        }
    }
}

/// Matcher YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl MatchYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "matcher.version must be >= 1".to_string(),
            ));
        }
        if !(self.min_similarity > 0.0 && self.min_similarity <= 1.0) {
            return Err(ConfigLoadError::Validation(
                "matcher.min_similarity must be in (0, 1]".to_string(),
            ));
        }
        if self.max_results == Some(0) {
            return Err(ConfigLoadError::Validation(
                "matcher.max_results must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            min_similarity: default_min_similarity(),
            max_results: None,
        }
    }
}

fn default_version() -> u32 {
    1
}

fn true_value() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_regions_file() -> String {
    "regions.json".to_string()
}

fn default_departements_file() -> String {
    "departements.json".to_string()
}

fn default_communes_file() -> String {
    "communes.json".to_string()
}

fn default_min_similarity() -> f64 {
    0.85
}
