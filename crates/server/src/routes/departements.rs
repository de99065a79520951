use super::FilterParams;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use decoupage::{EntityKind, OutputFormat, Payload, SearchRequest};
use std::sync::Arc;

/// `GET /departements`: every departement when no filter is given, a
/// filtered search otherwise.
pub async fn search_departements(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Departement)?;
    let request = params.query(EntityKind::Departement);

    let engine = state.engine.current();
    let payload = if request.has_no_criteria() {
        engine.list(
            EntityKind::Departement,
            &fields,
            OutputFormat::Json,
            params.limit,
        )?
    } else {
        engine.search(&SearchRequest::new(request).with_fields(fields))?
    };
    Ok(Json(payload))
}

/// `GET /departements/{code}`
pub async fn get_departement(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Departement)?;

    let engine = state.engine.current();
    Ok(Json(engine.get(
        EntityKind::Departement,
        &code,
        &fields,
        OutputFormat::Json,
    )?))
}

/// `GET /departements/{code}/communes`: 404 when the departement is unknown,
/// an empty list when it has no communes.
pub async fn departement_communes(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> ServerResult<Json<Payload>> {
    let params = FilterParams::extract(query)?;
    let fields = params.field_set(EntityKind::Commune)?;
    let format = params.output_format()?;

    let engine = state.engine.current();
    Ok(Json(engine.children(
        EntityKind::Departement,
        &code,
        &fields,
        format,
        params.limit,
    )?))
}
