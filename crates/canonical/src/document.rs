//! Output type of the name canonicalization pipeline.

use serde::{Deserialize, Serialize};

/// One word of a [`CanonicalName`], with its byte span in the folded text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// The folded form of a name or query.
///
/// For a fixed [`CanonicalizeConfig`](crate::CanonicalizeConfig) version and
/// input, every field is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalName {
    /// Folded text, single-space separated, no leading/trailing whitespace.
    pub text: String,
    /// Tokens of `text` with byte offsets.
    pub tokens: Vec<Token>,
    /// Version of the folding rules that produced this name.
    pub canonical_version: u32,
}

impl CanonicalName {
    /// Iterate over token texts.
    pub fn token_texts(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.text.as_str())
    }

    /// Length of the folded text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
