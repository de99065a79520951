//! Name canonicalization layer.
//!
//! Folds administrative division names and free-text queries into a
//! deterministic comparison form, so that "Normandie", "normandie" and
//! "NORMANDIE" (or "Évreux" and "evreux") are indistinguishable to the matcher.
//!
//! ## What we do
//!
//! - Unicode decomposition (NFKD) and removal of non-spacing marks
//! - Ligature expansion ("œ" → "oe")
//! - Locale-free lowercasing
//! - Punctuation treated as a separator ("Saint-Denis" → "saint denis")
//! - Whitespace collapsing and tokenization with byte offsets
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Same text and config, same
//! result on any machine.

mod config;
mod document;
mod error;
mod pipeline;

pub use crate::config::CanonicalizeConfig;
pub use crate::document::{CanonicalName, Token};
pub use crate::error::CanonicalError;
pub use crate::pipeline::{canonicalize, fold};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_canonicalize_default() {
        let cfg = CanonicalizeConfig::default();
        let out = canonicalize("  Provence-Alpes-Côte d'Azur ", &cfg).expect("canonicalization succeeds");

        assert_eq!(out.text, "provence alpes cote d azur");
        assert_eq!(out.canonical_version, cfg.version);
        let texts: Vec<&str> = out.token_texts().collect();
        assert_eq!(texts, vec!["provence", "alpes", "cote", "d", "azur"]);
        assert_eq!(out.tokens[0].start, 0);
        assert_eq!(out.tokens[0].end, "provence".len());
    }

    #[test]
    fn case_and_accent_insensitive() {
        let cfg = CanonicalizeConfig::default();
        let variants = ["Normandie", "normandie", "NORMANDIE", "Nórmandíe"];
        let folded: Vec<String> = variants
            .iter()
            .map(|v| canonicalize(v, &cfg).expect("fold").text)
            .collect();
        assert!(folded.iter().all(|f| f == "normandie"));
    }

    #[test]
    fn composed_and_decomposed_forms_match() {
        assert_eq!(fold("\u{00C9}vreux"), fold("E\u{0301}vreux"));
        assert_eq!(fold("Évreux"), "evreux");
    }

    #[test]
    fn stacked_marks_dropped_with_offsets_on_folded_text() {
        let out = canonicalize("A\u{0302}\u{0301}rles Sa\u{0302}ne", &CanonicalizeConfig::default())
            .expect("canonicalization succeeds");
        assert_eq!(out.text, "arles sane");
        assert_eq!((out.tokens[1].start, out.tokens[1].end), (6, 10));
    }

    #[test]
    fn ligatures_expand() {
        assert_eq!(fold("Œuilly"), "oeuilly");
        assert_eq!(fold("Lætitia"), "laetitia");
    }

    #[test]
    fn keep_accents_when_folding_disabled() {
        let cfg = CanonicalizeConfig {
            fold_diacritics: false,
            ..Default::default()
        };
        let out = canonicalize("E\u{0301}vreux", &cfg).expect("canonicalization succeeds");
        assert_eq!(out.text, "\u{00E9}vreux");
    }

    #[test]
    fn punctuation_kept_when_not_stripping() {
        let cfg = CanonicalizeConfig {
            strip_punctuation: false,
            ..Default::default()
        };
        let out = canonicalize("Saint-Denis", &cfg).expect("canonicalization succeeds");
        assert_eq!(out.text, "saint-denis");
        assert_eq!(out.tokens.len(), 1);
    }

    #[test]
    fn empty_input_rejected() {
        let cfg = CanonicalizeConfig::default();
        assert!(matches!(canonicalize("   ", &cfg), Err(CanonicalError::EmptyInput)));
        assert!(matches!(canonicalize(" - ' ", &cfg), Err(CanonicalError::EmptyInput)));
        assert_eq!(fold(""), "");
    }

    #[test]
    fn invalid_config_version_rejected() {
        let cfg = CanonicalizeConfig {
            version: 0,
            ..Default::default()
        };
        let res = canonicalize("Paris", &cfg);
        assert!(matches!(res, Err(CanonicalError::InvalidConfig(_))));
    }

    #[test]
    fn folding_is_deterministic() {
        let cfg = CanonicalizeConfig::default();
        let a = canonicalize("Île-de-France", &cfg).expect("first");
        let b = canonicalize("Île-de-France", &cfg).expect("second");
        assert_eq!(a, b);
        assert_eq!(a.text, "ile de france");
    }
}
