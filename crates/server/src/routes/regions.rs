use super::FilterParams;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use decoupage::{EntityKind, OutputFormat, Payload, SearchRequest};
use std::sync::Arc;

/// `GET /regions`
pub async fn search_regions(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Region)?;
    let request = params.query(EntityKind::Region);

    let engine = state.engine.current();
    let payload = if request.has_no_criteria() {
        engine.list(
            EntityKind::Region,
            &fields,
            OutputFormat::Json,
            params.limit,
        )?
    } else {
        engine.search(&SearchRequest::new(request).with_fields(fields))?
    };
    Ok(Json(payload))
}

/// `GET /regions/{code}`
pub async fn get_region(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Region)?;

    let engine = state.engine.current();
    Ok(Json(engine.get(
        EntityKind::Region,
        &code,
        &fields,
        OutputFormat::Json,
    )?))
}

/// `GET /regions/{code}/departements`
pub async fn region_departements(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Departement)?;

    let engine = state.engine.current();
    Ok(Json(engine.children(
        EntityKind::Region,
        &code,
        &fields,
        OutputFormat::Json,
        params.limit,
    )?))
}
