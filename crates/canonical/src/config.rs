//! Configuration types for name canonicalization.
//!
//! [`CanonicalizeConfig`] controls how a display name (or a free-text query)
//! is folded before it is compared against other names.
//!
//! # Versioning
//!
//! The `version` field tracks folding behavior. Any change that alters the
//! folded form of a name must bump it, so name tables built with one version
//! are never compared against queries folded with another.
//!
//! # Examples
//!
//! ```rust
//! use canonical::CanonicalizeConfig;
//!
//! let config = CanonicalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert!(config.fold_diacritics);
//! assert!(config.strip_punctuation);
//! assert!(config.lowercase);
//! ```

use serde::{Deserialize, Serialize};

/// Configuration for the name canonicalization pipeline.
///
/// Cheap to clone and serializable so it can be embedded in higher-level
/// configuration files.
///
/// ```json
/// {
///   "version": 1,
///   "fold_diacritics": true,
///   "strip_punctuation": true,
///   "lowercase": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalizeConfig {
    /// Version of the folding rules. Must be >= 1; version 0 is reserved.
    pub version: u32,

    /// Decompose (NFKD) and drop non-spacing marks, so "Évreux" and "evreux"
    /// fold to the same text. Ligatures such as "œ" and "æ" are expanded.
    ///
    /// When disabled the text is still NFKC-normalized, which keeps composed
    /// and decomposed spellings equal without removing accents.
    pub fold_diacritics: bool,

    /// Treat punctuation (hyphens, apostrophes, dots) as token separators.
    /// "Saint-Denis" becomes "saint denis".
    pub strip_punctuation: bool,

    /// Apply locale-free Unicode lowercasing.
    pub lowercase: bool,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            fold_diacritics: true,
            strip_punctuation: true,
            lowercase: true,
        }
    }
}
