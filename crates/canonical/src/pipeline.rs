use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::config::CanonicalizeConfig;
use crate::document::{CanonicalName, Token};
use crate::error::CanonicalError;

/// Main entry point. Folds a name (or a query) according to `cfg`.
pub fn canonicalize(input: &str, cfg: &CanonicalizeConfig) -> Result<CanonicalName, CanonicalError> {
    // Version 0 is reserved.
    if cfg.version == 0 {
        return Err(CanonicalError::InvalidConfig(
            "config version must be >= 1".into(),
        ));
    }

    // Decomposition must happen first: it moves accents into separate
    // combining characters that the folding step can drop.
    let normalized_text: String = if cfg.fold_diacritics {
        input.nfkd().collect()
    } else {
        input.nfkc().collect()
    };

    let mut text = String::with_capacity(normalized_text.len());
    let mut tokens: Vec<Token> = Vec::with_capacity(4);
    let mut pending_space = false;
    let mut current_token_start: Option<usize> = None;

    for ch in normalized_text.chars() {
        if cfg.fold_diacritics && ch.is_mark_nonspacing() {
            continue;
        }
        for expanded in expand_ligature(ch, cfg.fold_diacritics) {
            if cfg.lowercase {
                for lower in expanded.to_lowercase() {
                    dispatch_char(
                        lower,
                        cfg,
                        &mut text,
                        &mut tokens,
                        &mut pending_space,
                        &mut current_token_start,
                    );
                }
            } else {
                dispatch_char(
                    expanded,
                    cfg,
                    &mut text,
                    &mut tokens,
                    &mut pending_space,
                    &mut current_token_start,
                );
            }
        }
    }

    finalize_token(&mut tokens, &text, &mut current_token_start);

    if text.is_empty() {
        return Err(CanonicalError::EmptyInput);
    }

    Ok(CanonicalName {
        text,
        tokens,
        canonical_version: cfg.version,
    })
}

/// Folds `input` with the default configuration, returning an empty string
/// when nothing survives normalization.
pub fn fold(input: &str) -> String {
    canonicalize(input, &CanonicalizeConfig::default())
        .map(|name| name.text)
        .unwrap_or_default()
}

/// NFKD leaves these untouched, but French names spell them interchangeably
/// with their two-letter forms ("Œuilly" / "Oeuilly").
fn expand_ligature(ch: char, fold: bool) -> impl Iterator<Item = char> {
    let pair: [Option<char>; 2] = match (fold, ch) {
        (true, 'œ') => [Some('o'), Some('e')],
        (true, 'Œ') => [Some('O'), Some('E')],
        (true, 'æ') => [Some('a'), Some('e')],
        (true, 'Æ') => [Some('A'), Some('E')],
        _ => [Some(ch), None],
    };
    pair.into_iter().flatten()
}

/// Decides whether a character is part of a token or a delimiter.
fn dispatch_char(
    ch: char,
    cfg: &CanonicalizeConfig,
    text: &mut String,
    tokens: &mut Vec<Token>,
    pending_space: &mut bool,
    current_token_start: &mut Option<usize>,
) {
    let is_delim = ch.is_whitespace()
        || (cfg.strip_punctuation && (ch.is_punctuation() || ch.is_symbol()));
    if is_delim {
        finalize_token(tokens, text, current_token_start);
        if !text.is_empty() {
            *pending_space = true;
        }
    } else {
        append_char(ch, text, current_token_start, pending_space);
    }
}

fn append_char(
    ch: char,
    text: &mut String,
    current_token_start: &mut Option<usize>,
    pending_space: &mut bool,
) {
    if *pending_space {
        text.push(' ');
        *pending_space = false;
        *current_token_start = Some(text.len());
    } else if current_token_start.is_none() {
        *current_token_start = Some(text.len());
    }

    text.push(ch);
}

fn finalize_token(tokens: &mut Vec<Token>, text: &str, current_token_start: &mut Option<usize>) {
    if let Some(start) = current_token_start.take() {
        if start < text.len() {
            let end = text.len();
            tokens.push(Token {
                text: text[start..end].to_string(),
                start,
                end,
            });
        }
    }
}
