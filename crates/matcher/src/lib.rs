//! # Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` evaluates structured filter requests against a [`GeoIndex`]
//! built by the `index` crate. Exact filters (code, postal code, parent
//! departement or region) narrow the candidate set; an optional name filter
//! then ranks what is left with an accent- and case-insensitive fuzzy score.
//!
//! ## Core Types
//!
//! - [`QueryRequest`]: entity kind plus optional filters and a result limit.
//! - [`MatchConfig`]: similarity threshold and global result cap.
//! - [`ResultSet`] / [`Hit`]: ordered slots into the index, with a relevance
//!   score when a name filter ranked them.
//! - [`Matcher`]: the engine; `query`, `get`, `children`, `all`.
//!
//! ## Ordering
//!
//! Unranked results are ascending by code. Ranked results are by score
//! descending, ties broken by code ascending. `limit` applies after ordering.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use canonical::CanonicalizeConfig;
//! use index::GeoIndex;
//! use ingest::{EntityKind, Region, Snapshot};
//! use matcher::{MatchConfig, Matcher, QueryRequest};
//!
//! let snapshot = Snapshot {
//!     regions: vec![Region { code: "28".into(), nom: "Normandie".into() }],
//!     ..Snapshot::default()
//! };
//! let index = Arc::new(GeoIndex::build(snapshot).expect("index"));
//! let matcher = Matcher::new(index, &CanonicalizeConfig::default(), MatchConfig::default())
//!     .expect("matcher");
//!
//! let result = matcher
//!     .query(&QueryRequest::new(EntityKind::Region).with_nom("normandie"))
//!     .expect("query");
//! assert_eq!(result.codes(matcher.index()), vec!["28"]);
//! assert_eq!(result.hits[0].score, Some(1.0));
//! ```
//!
//! [`GeoIndex`]: index::GeoIndex

pub mod engine;
pub mod fuzzy;
pub mod types;

pub use crate::engine::Matcher;
pub use crate::fuzzy::{relevance, FoldedName, NameTable};
pub use crate::types::{
    max_code_len, Hit, MatchConfig, MatchError, Predicate, QueryRequest, ResultSet,
    ValidationError, POSTAL_CODE_LEN,
};
