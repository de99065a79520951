use index::{Entity, GeoIndex, LookupError, Slot};
use ingest::EntityKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest code of each kind: "2A004", "976", "84".
pub fn max_code_len(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Commune => 5,
        EntityKind::Departement => 3,
        EntityKind::Region => 2,
    }
}

/// Postal codes are exactly this many ASCII digits.
pub const POSTAL_CODE_LEN: usize = 5;

/// Engine-wide tuning knobs.
///
/// Cheap to clone and serde-friendly so it can be embedded in the root YAML
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Configuration schema version.
    pub version: String,
    /// Minimum Jaro-Winkler similarity for a name that is neither equal to
    /// nor prefixed by the query.
    #[serde(default = "MatchConfig::default_min_similarity")]
    pub min_similarity: f64,
    /// Upper bound on the number of hits any query returns; `None` means
    /// unbounded. A request `limit` can only lower it.
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl MatchConfig {
    pub(crate) fn default_min_similarity() -> f64 {
        0.85
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.version.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "config.version must not be empty".into(),
            ));
        }
        if !(self.min_similarity > 0.0 && self.min_similarity <= 1.0) {
            return Err(MatchError::InvalidConfig(
                "min_similarity must be in (0.0, 1.0]".into(),
            ));
        }
        if self.max_results == Some(0) {
            return Err(MatchError::InvalidConfig(
                "max_results must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            min_similarity: Self::default_min_similarity(),
            max_results: None,
        }
    }
}

/// A structured filter request against one entity kind.
///
/// Every supplied filter must hold for a result (AND semantics).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub kind: EntityKind,
    /// Exact code equality.
    pub code: Option<String>,
    /// Fuzzy name match; results are ranked and scored.
    pub nom: Option<String>,
    /// Postal-code membership (communes only).
    pub code_postal: Option<String>,
    /// Parent departement (communes only).
    pub code_departement: Option<String>,
    /// Parent region (communes and departements).
    pub code_region: Option<String>,
    /// Truncates the ordered result set.
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            code: None,
            nom: None,
            code_postal: None,
            code_departement: None,
            code_region: None,
            limit: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_nom(mut self, nom: impl Into<String>) -> Self {
        self.nom = Some(nom.into());
        self
    }

    pub fn with_code_postal(mut self, code_postal: impl Into<String>) -> Self {
        self.code_postal = Some(code_postal.into());
        self
    }

    pub fn with_code_departement(mut self, code_departement: impl Into<String>) -> Self {
        self.code_departement = Some(code_departement.into());
        self
    }

    pub fn with_code_region(mut self, code_region: impl Into<String>) -> Self {
        self.code_region = Some(code_region.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when no filter at all was supplied (`limit` is not a filter).
    /// Blank values count as absent.
    pub fn has_no_criteria(&self) -> bool {
        [
            &self.code,
            &self.nom,
            &self.code_postal,
            &self.code_departement,
            &self.code_region,
        ]
        .into_iter()
        .all(|value| given(value).is_none())
    }

    /// Validates the request and splits it into predicates.
    ///
    /// Exact predicates come first, in a fixed order, and the name predicate
    /// (if any) last.
    pub fn predicates(&self) -> Result<Vec<Predicate>, MatchError> {
        if self.has_no_criteria() {
            return Err(MatchError::NoCriteria);
        }
        check_limit(self.limit)?;

        let mut predicates = Vec::with_capacity(5);
        if let Some(code) = given(&self.code) {
            predicates.push(Predicate::Code(parse_code("code", self.kind, code)?));
        }
        if let Some(code_postal) = given(&self.code_postal) {
            self.require_kind("codePostal", &[EntityKind::Commune])?;
            predicates.push(Predicate::PostalCode(parse_postal_code(code_postal)?));
        }
        if let Some(code_departement) = given(&self.code_departement) {
            self.require_kind("codeDepartement", &[EntityKind::Commune])?;
            predicates.push(Predicate::Parent {
                kind: EntityKind::Departement,
                code: parse_code("codeDepartement", EntityKind::Departement, code_departement)?,
            });
        }
        if let Some(code_region) = given(&self.code_region) {
            self.require_kind(
                "codeRegion",
                &[EntityKind::Commune, EntityKind::Departement],
            )?;
            predicates.push(Predicate::Parent {
                kind: EntityKind::Region,
                code: parse_code("codeRegion", EntityKind::Region, code_region)?,
            });
        }
        if let Some(nom) = given(&self.nom) {
            predicates.push(Predicate::Name(nom.trim().to_string()));
        }
        Ok(predicates)
    }

    fn require_kind(&self, filter: &'static str, allowed: &[EntityKind]) -> Result<(), MatchError> {
        if allowed.contains(&self.kind) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedFilter {
                filter,
                kind: self.kind,
            }
            .into())
        }
    }
}

/// A filter value that was actually supplied: present and not blank.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub(crate) fn check_limit(limit: Option<usize>) -> Result<(), MatchError> {
    if limit == Some(0) {
        Err(ValidationError::InvalidLimit.into())
    } else {
        Ok(())
    }
}

fn parse_code(
    filter: &'static str,
    kind: EntityKind,
    raw: &str,
) -> Result<String, ValidationError> {
    let code = raw.trim();
    let well_formed = !code.is_empty()
        && code.len() <= max_code_len(kind)
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    if well_formed {
        Ok(code.to_string())
    } else {
        Err(ValidationError::MalformedCode {
            filter,
            value: raw.to_string(),
        })
    }
}

fn parse_postal_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim();
    if code.len() == POSTAL_CODE_LEN && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code.to_string())
    } else {
        Err(ValidationError::MalformedPostalCode {
            value: raw.to_string(),
        })
    }
}

/// One filter condition of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Code(String),
    PostalCode(String),
    Parent { kind: EntityKind, code: String },
    Name(String),
}

/// One matched entity. `score` is set only when a name predicate ranked it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub slot: Slot,
    pub score: Option<f64>,
}

/// Ordered result of a query: ascending code for exact predicates, ranked by
/// score (ties by code) when a name predicate was involved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub kind: EntityKind,
    pub hits: Vec<Hit>,
}

impl ResultSet {
    pub(crate) fn unscored(kind: EntityKind, slots: impl IntoIterator<Item = Slot>) -> Self {
        Self {
            kind,
            hits: slots
                .into_iter()
                .map(|slot| Hit { slot, score: None })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn truncate(&mut self, limit: Option<usize>) {
        if let Some(limit) = limit {
            self.hits.truncate(limit);
        }
    }

    /// Resolve every hit against the index it came from.
    pub fn entities<'a>(
        &'a self,
        index: &'a GeoIndex,
    ) -> impl Iterator<Item = (Entity<'a>, Option<f64>)> + 'a {
        let kind = self.kind;
        self.hits
            .iter()
            .filter_map(move |hit| index.entity(kind, hit.slot).map(|e| (e, hit.score)))
    }

    /// Codes of the hits, in result order.
    pub fn codes<'a>(&'a self, index: &'a GeoIndex) -> Vec<&'a str> {
        self.entities(index).map(|(e, _)| e.code()).collect()
    }
}

/// Caller-supplied parameters are structurally invalid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("filter {filter} is not supported for {kind}")]
    UnsupportedFilter {
        filter: &'static str,
        kind: EntityKind,
    },
    #[error("malformed {filter}: {value:?}")]
    MalformedCode { filter: &'static str, value: String },
    #[error("malformed codePostal: {value:?}")]
    MalformedPostalCode { value: String },
    #[error("limit must be greater than zero")]
    InvalidLimit,
    #[error("{child} entities are not listed under a {parent}")]
    InvalidHierarchy {
        parent: EntityKind,
        child: EntityKind,
    },
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// No filter was supplied; the engine never returns an unfiltered collection
    /// from `query`.
    #[error("at least one filter is required")]
    NoCriteria,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A single-entity lookup found nothing.
    #[error("{kind} {code} not found")]
    NotFound { kind: EntityKind, code: String },
    /// A hierarchy listing named a parent that does not exist.
    #[error("{kind} {code} not found")]
    ParentNotFound { kind: EntityKind, code: String },
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
}

impl MatchError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, MatchError::NoCriteria | MatchError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MatchError::NotFound { .. } | MatchError::ParentNotFound { .. }
        )
    }
}

impl From<LookupError> for MatchError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::ParentNotFound { kind, code } => MatchError::ParentNotFound { kind, code },
            LookupError::InvalidHierarchy { parent, child } => {
                ValidationError::InvalidHierarchy { parent, child }.into()
            }
        }
    }
}
