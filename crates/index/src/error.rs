use ingest::EntityKind;
use thiserror::Error;

/// The snapshot violates a cross-record invariant. Fatal: the index is never
/// built, so the engine never becomes reachable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreBuildError {
    #[error("duplicate {kind} code {code}")]
    DuplicateCode { kind: EntityKind, code: String },

    #[error("{kind} {code}: {field} references unknown {target}")]
    DanglingReference {
        kind: EntityKind,
        code: String,
        field: &'static str,
        target: String,
    },

    #[error("commune {code} has no postal code")]
    EmptyPostalCodes { code: String },

    #[error("commune {code}: departement {departement} belongs to region {expected}, not {found}")]
    InconsistentRegion {
        code: String,
        departement: String,
        expected: String,
        found: String,
    },
}

/// Per-query lookup failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The parent code does not exist. Distinct from "parent found, no children".
    #[error("{kind} {code} not found")]
    ParentNotFound { kind: EntityKind, code: String },

    #[error("{child} entities are not listed under a {parent}")]
    InvalidHierarchy {
        parent: EntityKind,
        child: EntityKind,
    },
}
