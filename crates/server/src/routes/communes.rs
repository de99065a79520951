use super::FilterParams;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use decoupage::{EntityKind, Payload, SearchRequest};
use std::sync::Arc;

/// `GET /communes`: filtered search. At least one filter is required.
pub async fn search_communes(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let request = SearchRequest::new(params.query(EntityKind::Commune))
        .with_fields(params.field_set(EntityKind::Commune)?)
        .with_format(params.output_format()?);

    let engine = state.engine.current();
    Ok(Json(engine.search(&request)?))
}

/// `GET /communes/{code}`
pub async fn get_commune(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Commune)?;
    let format = params.output_format()?;

    let engine = state.engine.current();
    Ok(Json(engine.get(EntityKind::Commune, &code, &fields, format)?))
}
