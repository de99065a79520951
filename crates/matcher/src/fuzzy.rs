//! Fuzzy name matching over folded names.
//!
//! Every entity name is folded once when the [`NameTable`] is built; a query is
//! folded once per search and compared against the prefolded candidates.

use std::cmp::Ordering;

use canonical::{canonicalize, CanonicalError, CanonicalizeConfig};
use index::{GeoIndex, Slot};
use ingest::EntityKind;

use crate::types::Hit;

const EXACT_SCORE: f64 = 1.0;
const PREFIX_BASE: f64 = 0.8;
const TOKEN_PREFIX_BASE: f64 = 0.6;
const TIER_SPAN: f64 = 0.19;
const SIMILARITY_WEIGHT: f64 = 0.59;

/// A name in comparison form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FoldedName {
    pub text: String,
    pub tokens: Vec<String>,
    char_len: usize,
}

impl FoldedName {
    /// Folds `raw`. Returns `None` when nothing survives folding.
    pub fn fold(raw: &str, cfg: &CanonicalizeConfig) -> Option<Self> {
        match canonicalize(raw, cfg) {
            Ok(name) => Some(Self {
                char_len: name.char_len(),
                tokens: name.token_texts().map(str::to_string).collect(),
                text: name.text,
            }),
            Err(CanonicalError::EmptyInput) | Err(CanonicalError::InvalidConfig(_)) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Relevance of `candidate` for `query`, or `None` when it is not a match.
///
/// Tiers never overlap: exact equality beats any prefix match, a whole-name
/// prefix beats a token prefix, and a token prefix beats plain similarity.
pub fn relevance(query: &FoldedName, candidate: &FoldedName, min_similarity: f64) -> Option<f64> {
    if query.is_empty() || candidate.is_empty() {
        return None;
    }
    if query.text == candidate.text {
        return Some(EXACT_SCORE);
    }

    let coverage = (query.char_len as f64 / candidate.char_len as f64).min(1.0);
    if candidate.text.starts_with(&query.text) {
        return Some(PREFIX_BASE + TIER_SPAN * coverage);
    }
    if tokens_prefix(&query.tokens, &candidate.tokens) {
        return Some(TOKEN_PREFIX_BASE + TIER_SPAN * coverage);
    }

    let similarity = strsim::jaro_winkler(&query.text, &candidate.text);
    (similarity >= min_similarity).then_some(SIMILARITY_WEIGHT * similarity)
}

/// Every query token prefixes a distinct candidate token, in order.
fn tokens_prefix(query: &[String], candidate: &[String]) -> bool {
    let mut remaining = candidate.iter();
    query
        .iter()
        .all(|q| remaining.by_ref().any(|c| c.starts_with(q.as_str())))
}

/// Folded names of every entity, aligned with the index arenas.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    communes: Vec<FoldedName>,
    departements: Vec<FoldedName>,
    regions: Vec<FoldedName>,
    cfg: CanonicalizeConfig,
}

impl NameTable {
    pub fn build(index: &GeoIndex, cfg: &CanonicalizeConfig) -> Self {
        let fold_all = |kind: EntityKind| -> Vec<FoldedName> {
            index
                .all(kind)
                .map(|entity| FoldedName::fold(entity.nom(), cfg).unwrap_or_default())
                .collect()
        };
        Self {
            communes: fold_all(EntityKind::Commune),
            departements: fold_all(EntityKind::Departement),
            regions: fold_all(EntityKind::Region),
            cfg: cfg.clone(),
        }
    }

    fn names(&self, kind: EntityKind) -> &[FoldedName] {
        match kind {
            EntityKind::Commune => &self.communes,
            EntityKind::Departement => &self.departements,
            EntityKind::Region => &self.regions,
        }
    }

    /// Ranks the candidates of `kind` against `query`.
    ///
    /// `candidates` restricts the scan to the given slots; `None` scans the
    /// whole arena. An empty query yields no hits. Hits are ordered by score
    /// descending, then by slot (code) ascending.
    pub fn search(
        &self,
        kind: EntityKind,
        query: &str,
        candidates: Option<&[Slot]>,
        min_similarity: f64,
    ) -> Vec<Hit> {
        let Some(query) = FoldedName::fold(query, &self.cfg) else {
            return Vec::new();
        };
        let names = self.names(kind);
        let score = |slot: Slot| {
            names
                .get(slot)
                .and_then(|name| relevance(&query, name, min_similarity))
                .map(|score| Hit {
                    slot,
                    score: Some(score),
                })
        };

        let mut hits: Vec<Hit> = match candidates {
            Some(slots) => slots.iter().filter_map(|&slot| score(slot)).collect(),
            None => (0..names.len()).filter_map(score).collect(),
        };
        hits.sort_by(rank_order);
        hits
    }
}

fn rank_order(a: &Hit, b: &Hit) -> Ordering {
    let sa = a.score.unwrap_or(0.0);
    let sb = b.score.unwrap_or(0.0);
    sb.total_cmp(&sa).then(a.slot.cmp(&b.slot))
}
