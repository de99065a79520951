use std::sync::Arc;
use std::time::Instant;

use canonical::CanonicalizeConfig;
use index::{Entity, GeoIndex, LookupError, Slot};
use ingest::EntityKind;
use tracing::{debug, info};

use crate::fuzzy::NameTable;
use crate::types::{check_limit, MatchConfig, MatchError, Predicate, QueryRequest, ResultSet};

#[cfg(test)]
mod tests;

/// Query engine over one immutable [`GeoIndex`].
///
/// Folded names are computed once at construction; a `Matcher` is never
/// mutated afterwards and can be shared freely between threads.
pub struct Matcher {
    index: Arc<GeoIndex>,
    names: NameTable,
    cfg: MatchConfig,
}

impl Matcher {
    /// Build a matcher, folding every entity name with `canonical_cfg`.
    pub fn new(
        index: Arc<GeoIndex>,
        canonical_cfg: &CanonicalizeConfig,
        cfg: MatchConfig,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;
        let started = Instant::now();
        let names = NameTable::build(&index, canonical_cfg);
        debug!(
            communes = index.len(EntityKind::Commune),
            elapsed_micros = started.elapsed().as_micros() as u64,
            "name_table_built"
        );
        Ok(Self { index, names, cfg })
    }

    pub fn index(&self) -> &Arc<GeoIndex> {
        &self.index
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Evaluate a filter request.
    ///
    /// Exact predicates narrow the candidate set by intersecting sorted slot
    /// lists; a name predicate then ranks whatever is left. A parent or postal
    /// code that matches nothing gives an empty result, not an error.
    pub fn query(&self, req: &QueryRequest) -> Result<ResultSet, MatchError> {
        let started = Instant::now();
        let predicates = match req.predicates() {
            Ok(predicates) => predicates,
            Err(err) => {
                debug!(kind = %req.kind, error = %err, "query_rejected");
                return Err(err);
            }
        };

        let kind = req.kind;
        let mut candidates: Option<Vec<Slot>> = None;
        let mut name_query: Option<&str> = None;

        for predicate in &predicates {
            let slots = match predicate {
                Predicate::Name(text) => {
                    name_query = Some(text.as_str());
                    continue;
                }
                Predicate::Code(code) => self.index.position(kind, code).into_iter().collect(),
                Predicate::PostalCode(postal) => self.index.postal_code_slots(postal).to_vec(),
                Predicate::Parent {
                    kind: parent,
                    code,
                } => match self.index.children_of(*parent, code, kind) {
                    Ok(children) => children.slots().to_vec(),
                    Err(LookupError::ParentNotFound { .. }) => Vec::new(),
                    Err(err) => return Err(err.into()),
                },
            };
            candidates = Some(match candidates {
                None => slots,
                Some(previous) => intersect_sorted(&previous, &slots),
            });
        }

        let mut result = match name_query {
            Some(text) => ResultSet {
                kind,
                hits: self.names.search(
                    kind,
                    text,
                    candidates.as_deref(),
                    self.cfg.min_similarity,
                ),
            },
            None => ResultSet::unscored(kind, candidates.unwrap_or_default()),
        };
        result.truncate(self.effective_limit(req.limit));

        info!(
            kind = %kind,
            predicates = predicates.len(),
            ranked = name_query.is_some(),
            hits = result.len(),
            elapsed_micros = started.elapsed().as_micros() as u64,
            "query_completed"
        );
        Ok(result)
    }

    /// The single entity of `kind` with `code`.
    pub fn get(&self, kind: EntityKind, code: &str) -> Result<Entity<'_>, MatchError> {
        self.index
            .by_code(kind, code.trim())
            .ok_or_else(|| MatchError::NotFound {
                kind,
                code: code.to_string(),
            })
    }

    /// Direct children of a parent: departements of a region, communes of a
    /// departement. Regions have no children here.
    pub fn children(
        &self,
        parent: EntityKind,
        parent_code: &str,
        limit: Option<usize>,
    ) -> Result<ResultSet, MatchError> {
        let child = match parent {
            EntityKind::Region => EntityKind::Departement,
            EntityKind::Departement => EntityKind::Commune,
            EntityKind::Commune => {
                return Err(LookupError::InvalidHierarchy {
                    parent,
                    child: EntityKind::Commune,
                }
                .into())
            }
        };
        self.children_of_kind(parent, parent_code, child, limit)
    }

    /// Children of any supported hierarchy pair, including communes of a region.
    pub fn children_of_kind(
        &self,
        parent: EntityKind,
        parent_code: &str,
        child: EntityKind,
        limit: Option<usize>,
    ) -> Result<ResultSet, MatchError> {
        check_limit(limit)?;
        let children = self.index.children_of(parent, parent_code.trim(), child)?;
        let mut result = ResultSet::unscored(child, children.slots().iter().copied());
        result.truncate(self.effective_limit(limit));
        Ok(result)
    }

    /// Every entity of `kind`, ascending by code.
    pub fn all(&self, kind: EntityKind, limit: Option<usize>) -> Result<ResultSet, MatchError> {
        check_limit(limit)?;
        let mut result = ResultSet::unscored(kind, 0..self.index.len(kind));
        result.truncate(self.effective_limit(limit));
        Ok(result)
    }

    fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        match (requested, self.cfg.max_results) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Intersection of two ascending slot lists, ascending.
fn intersect_sorted(a: &[Slot], b: &[Slot]) -> Vec<Slot> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
