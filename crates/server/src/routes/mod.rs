//! API route handlers
//!
//! - `communes`, `departements`, `regions`: filter, lookup and hierarchy
//!   listings per entity kind
//! - `health`: liveness with dataset counts

pub mod communes;
pub mod departements;
pub mod health;
pub mod regions;

use crate::error::{ServerError, ServerResult};
use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::response::IntoResponse;
use decoupage::{EntityKind, FieldSet, OutputFormat, PipelineError, QueryRequest};
use serde::Deserialize;
use serde_json::json;

/// Query-string parameters shared by every listing route.
///
/// Which filters a kind accepts is decided by the engine; an unsupported one
/// is a validation error, not ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub code: Option<String>,
    pub nom: Option<String>,
    pub code_postal: Option<String>,
    pub code_departement: Option<String>,
    pub code_region: Option<String>,
    pub limit: Option<usize>,
    pub fields: Option<String>,
    pub format: Option<String>,
}

impl FilterParams {
    /// Unwraps the extractor result, turning a malformed query string into a
    /// 400 with the error envelope.
    pub(crate) fn extract(
        query: Result<Query<FilterParams>, QueryRejection>,
    ) -> ServerResult<Self> {
        Ok(query?.0)
    }

    pub(crate) fn query(&self, kind: EntityKind) -> QueryRequest {
        QueryRequest {
            kind,
            code: self.code.clone(),
            nom: self.nom.clone(),
            code_postal: self.code_postal.clone(),
            code_departement: self.code_departement.clone(),
            code_region: self.code_region.clone(),
            limit: self.limit,
        }
    }

    pub(crate) fn field_set(&self, kind: EntityKind) -> ServerResult<FieldSet> {
        FieldSet::parse_optional(kind, self.fields.as_deref())
            .map_err(|err| ServerError::from(PipelineError::from(err)))
    }

    /// Only commune routes offer GeoJSON; elsewhere the parameter is ignored.
    pub(crate) fn output_format(&self) -> ServerResult<OutputFormat> {
        OutputFormat::parse_optional(self.format.as_deref())
            .map_err(|err| ServerError::from(PipelineError::from(err)))
    }
}

/// API version and base info
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Decoupage Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/communes",
            "/communes/{code}",
            "/departements",
            "/departements/{code}",
            "/departements/{code}/communes",
            "/regions",
            "/regions/{code}",
            "/regions/{code}/departements",
            "/health"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
