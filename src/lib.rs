//! Workspace umbrella crate for the French administrative divisions service.
//!
//! This crate stitches together snapshot loading, indexing, matching and
//! projection so callers can answer a filter request with a single call and get
//! back a ready-to-serialize payload.
//!
//! ```text
//! dataset files ──ingest──> Snapshot ──index──> GeoIndex ──matcher──> ResultSet
//!                                                                         │
//!                                            Payload <──format/project────┘
//! ```

pub mod config;
pub mod format;
pub mod project;

pub use canonical::{CanonicalError, CanonicalizeConfig, canonicalize, fold};
pub use index::{Entity, GeoIndex, LookupError, StoreBuildError};
pub use ingest::{
    Commune, Departement, EntityKind, Geometry, IngestConfig, IngestError, Region, Snapshot,
    load_snapshot, parse_snapshot,
};
pub use matcher::{MatchConfig, MatchError, Matcher, QueryRequest, ResultSet, ValidationError};

pub use crate::config::{ConfigLoadError, DecoupageConfig};
pub use crate::format::{Feature, FeatureCollection, FormatError, OutputFormat, Payload, SCORE_KEY};
pub use crate::project::{Field, FieldSet, ProjectionError, Record, project};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Errors that can occur while building an engine or answering a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Ingest(IngestError),
    Store(StoreBuildError),
    Match(MatchError),
    Projection(ProjectionError),
    Format(FormatError),
    /// A configuration file could not be loaded.
    Config(String),
}

impl PipelineError {
    /// The caller sent something malformed; answering differently requires a
    /// different request.
    pub fn is_client_error(&self) -> bool {
        match self {
            PipelineError::Match(err) => err.is_client_error(),
            PipelineError::Projection(_) | PipelineError::Format(_) => true,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::Match(err) if err.is_not_found())
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "snapshot load failure: {err}"),
            PipelineError::Store(err) => write!(f, "snapshot rejected: {err}"),
            PipelineError::Match(err) => write!(f, "{err}"),
            PipelineError::Projection(err) => write!(f, "{err}"),
            PipelineError::Format(err) => write!(f, "{err}"),
            PipelineError::Config(msg) => write!(f, "configuration failure: {msg}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Store(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::Projection(err) => Some(err),
            PipelineError::Format(err) => Some(err),
            PipelineError::Config(_) => None,
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<StoreBuildError> for PipelineError {
    fn from(value: StoreBuildError) -> Self {
        PipelineError::Store(value)
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

impl From<ProjectionError> for PipelineError {
    fn from(value: ProjectionError) -> Self {
        PipelineError::Projection(value)
    }
}

impl From<FormatError> for PipelineError {
    fn from(value: FormatError) -> Self {
        PipelineError::Format(value)
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value.to_string())
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_load(&self, latency: Duration, result: Result<(), PipelineError>);
    fn record_query(&self, latency: Duration, result: Result<(), MatchError>);
    fn record_projection(&self, latency: Duration, result: Result<(), ProjectionError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_load(self, result: Result<(), PipelineError>) {
        self.recorder.record_load(self.start.elapsed(), result);
    }

    fn record_query(self, result: Result<(), MatchError>) {
        self.recorder.record_query(self.start.elapsed(), result);
    }

    fn record_projection(self, result: Result<(), ProjectionError>) {
        self.recorder
            .record_projection(self.start.elapsed(), result);
    }
}

/// A filter request plus output shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: QueryRequest,
    pub fields: FieldSet,
    pub format: OutputFormat,
}

impl SearchRequest {
    /// Default fields, flat JSON.
    pub fn new(query: QueryRequest) -> Self {
        let fields = FieldSet::default_for(query.kind);
        Self {
            query,
            fields,
            format: OutputFormat::Json,
        }
    }

    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// One loaded snapshot with its index and matcher.
///
/// Never mutated once built; share it behind an [`Arc`] and swap whole
/// engines through an [`EngineHandle`] to reload.
pub struct GeoEngine {
    matcher: Matcher,
}

impl GeoEngine {
    /// Index `snapshot` and prepare the matcher.
    pub fn from_snapshot(
        snapshot: Snapshot,
        canonical_cfg: &CanonicalizeConfig,
        match_cfg: MatchConfig,
    ) -> Result<Self, PipelineError> {
        let index = GeoIndex::build(snapshot)?;
        let matcher = Matcher::new(Arc::new(index), canonical_cfg, match_cfg)?;
        Ok(Self { matcher })
    }

    /// Load the dataset files named by `cfg` and build an engine over them.
    pub fn load(cfg: &DecoupageConfig) -> Result<Self, PipelineError> {
        let span = MetricsSpan::start();
        let result = cfg
            .validate()
            .map_err(PipelineError::from)
            .and_then(|()| {
                let snapshot = load_snapshot(&cfg.ingest_config())?;
                Self::from_snapshot(snapshot, &cfg.canonical_config(), cfg.match_config())
            });
        if let Some(span) = span {
            span.record_load(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        if let Ok(engine) = &result {
            info!(
                regions = engine.len(EntityKind::Region),
                departements = engine.len(EntityKind::Departement),
                communes = engine.len(EntityKind::Commune),
                "engine_ready"
            );
        }
        result
    }

    pub fn index(&self) -> &GeoIndex {
        self.matcher.index()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.index().len(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.index().is_empty()
    }

    /// Evaluate a filter request and render the hits.
    pub fn search(&self, req: &SearchRequest) -> Result<Payload, PipelineError> {
        check_fields(&req.fields, req.query.kind)?;

        let span = MetricsSpan::start();
        let result = self.matcher.query(&req.query);
        if let Some(span) = span {
            span.record_query(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        let result = result?;

        Ok(self.render(&result, &req.fields, req.format))
    }

    /// The single entity of `kind` with `code`.
    pub fn get(
        &self,
        kind: EntityKind,
        code: &str,
        fields: &FieldSet,
        format: OutputFormat,
    ) -> Result<Payload, PipelineError> {
        check_fields(fields, kind)?;
        let entity = self.matcher.get(kind, code)?;

        let span = MetricsSpan::start();
        let payload = format::render_one(self.index(), entity, fields, format);
        if let Some(span) = span {
            span.record_projection(Ok(()));
        }
        Ok(payload)
    }

    /// Direct children of a region or a departement, ascending by code and
    /// cut to `limit`. `fields` must be for the child kind.
    pub fn children(
        &self,
        parent: EntityKind,
        parent_code: &str,
        fields: &FieldSet,
        format: OutputFormat,
        limit: Option<usize>,
    ) -> Result<Payload, PipelineError> {
        let result = self.matcher.children(parent, parent_code, limit)?;
        check_fields(fields, result.kind)?;
        Ok(self.render(&result, fields, format))
    }

    /// Every entity of `kind`, ascending by code and cut to `limit`.
    pub fn list(
        &self,
        kind: EntityKind,
        fields: &FieldSet,
        format: OutputFormat,
        limit: Option<usize>,
    ) -> Result<Payload, PipelineError> {
        check_fields(fields, kind)?;
        Ok(self.render(&self.matcher.all(kind, limit)?, fields, format))
    }

    fn render(&self, result: &ResultSet, fields: &FieldSet, format: OutputFormat) -> Payload {
        let span = MetricsSpan::start();
        let payload = format::render_list(self.index(), result.entities(self.index()), fields, format);
        if let Some(span) = span {
            span.record_projection(Ok(()));
        }
        debug!(
            kind = %result.kind,
            format = %format,
            items = payload.len(),
            "payload_rendered"
        );
        payload
    }
}

/// Rejects a field set built for another kind; the failure counts as a
/// projection outcome.
fn check_fields(fields: &FieldSet, kind: EntityKind) -> Result<(), PipelineError> {
    let span = MetricsSpan::start();
    let result = fields.ensure_kind(kind);
    if let (Some(span), Err(err)) = (span, &result) {
        span.record_projection(Err(err.clone()));
    }
    Ok(result?)
}

/// Shared, swappable reference to the current engine.
///
/// Readers clone the inner [`Arc`] and keep using that snapshot for the whole
/// request; [`EngineHandle::replace`] installs a fully built engine at once.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<Arc<GeoEngine>>>,
}

impl EngineHandle {
    pub fn new(engine: GeoEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(engine))),
        }
    }

    pub fn current(&self) -> Arc<GeoEngine> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in `engine`, returning the previous one.
    pub fn replace(&self, engine: GeoEngine) -> Arc<GeoEngine> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(engine))
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.current();
        f.debug_struct("EngineHandle")
            .field("regions", &engine.len(EntityKind::Region))
            .field("departements", &engine.len(EntityKind::Departement))
            .field("communes", &engine.len(EntityKind::Commune))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;

    const REGIONS: &str = r#"[
        {"code": "28", "nom": "Normandie"},
        {"code": "44", "nom": "Grand Est"}
    ]"#;
    const DEPARTEMENTS: &str = r#"[
        {"code": "27", "nom": "Eure", "codeRegion": "28"},
        {"code": "55", "nom": "Meuse", "codeRegion": "44"}
    ]"#;
    const COMMUNES: &str = r#"[
        {"code": "55001", "nom": "Abainville", "codesPostaux": ["55130"],
         "population": 296, "codeDepartement": "55", "codeRegion": "44",
         "centre": {"type": "Point", "coordinates": [5.4939, 48.5314]}},
        {"code": "27229", "nom": "Évreux", "codesPostaux": ["27000"],
         "population": 46707, "codeDepartement": "27", "codeRegion": "28",
         "centre": {"type": "Point", "coordinates": [1.1508, 49.0241]},
         "contour": {"type": "Polygon", "coordinates": [[[1.1, 49.0], [1.2, 49.0], [1.2, 49.1], [1.1, 49.0]]]},
         "surface": 2646.0}
    ]"#;

    fn engine() -> GeoEngine {
        let snapshot =
            parse_snapshot(REGIONS, DEPARTEMENTS, COMMUNES, &IngestConfig::default()).unwrap();
        GeoEngine::from_snapshot(
            snapshot,
            &CanonicalizeConfig::default(),
            MatchConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn search_projects_default_fields() {
        let engine = engine();
        let req = SearchRequest::new(QueryRequest::new(EntityKind::Commune).with_code("55001"));
        let value = engine.search(&req).unwrap().to_value();
        assert_eq!(value[0]["nom"], "Abainville");
        assert_eq!(value[0]["codesPostaux"], serde_json::json!(["55130"]));
        assert!(value[0].get("centre").is_none());
        assert!(value[0].get(SCORE_KEY).is_none());
    }

    #[test]
    fn fuzzy_search_adds_score() {
        let engine = engine();
        let req = SearchRequest::new(QueryRequest::new(EntityKind::Region).with_nom("normandie"));
        let value = engine.search(&req).unwrap().to_value();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0][SCORE_KEY], 1.0);
    }

    #[test]
    fn geojson_prefers_contour() {
        let engine = engine();
        let fields = FieldSet::parse(EntityKind::Commune, "nom,contour").unwrap();
        let req = SearchRequest::new(QueryRequest::new(EntityKind::Commune).with_code("27229"))
            .with_fields(fields.clone())
            .with_format(OutputFormat::GeoJson);
        let value = engine.search(&req).unwrap().to_value();
        assert_eq!(value["type"], "FeatureCollection");
        let feature = &value["features"][0];
        assert_eq!(feature["geometry"]["type"], "Polygon");
        assert_eq!(feature["properties"], serde_json::json!({"nom": "Évreux"}));

        let single = engine
            .get(EntityKind::Commune, "55001", &fields, OutputFormat::GeoJson)
            .unwrap()
            .to_value();
        assert_eq!(single["type"], "Feature");
        assert_eq!(single["geometry"]["type"], "Point");
    }

    #[test]
    fn errors_classify_for_callers() {
        let engine = engine();
        let fields = FieldSet::default_for(EntityKind::Region);

        let missing = engine
            .get(EntityKind::Region, "99", &fields, OutputFormat::Json)
            .unwrap_err();
        assert!(missing.is_not_found());

        let no_criteria = engine
            .search(&SearchRequest::new(QueryRequest::new(EntityKind::Region)))
            .unwrap_err();
        assert!(no_criteria.is_client_error());

        let mismatch = engine
            .list(EntityKind::Commune, &fields, OutputFormat::Json, None)
            .unwrap_err();
        assert!(matches!(mismatch, PipelineError::Projection(_)));
    }

    #[test]
    fn children_and_list_are_code_ordered() {
        let engine = engine();
        let fields = FieldSet::default_for(EntityKind::Departement);
        let children = engine
            .children(EntityKind::Region, "44", &fields, OutputFormat::Json, None)
            .unwrap()
            .to_value();
        assert_eq!(children, serde_json::json!([{"code": "55", "nom": "Meuse", "codeRegion": "44"}]));

        let listed = engine
            .list(EntityKind::Departement, &fields, OutputFormat::Json, None)
            .unwrap();
        assert_eq!(listed.len(), 2);

        let limited = engine
            .list(EntityKind::Departement, &fields, OutputFormat::Json, Some(1))
            .unwrap()
            .to_value();
        assert_eq!(limited, serde_json::json!([{"code": "27", "nom": "Eure", "codeRegion": "28"}]));
    }

    #[test]
    fn handle_swaps_whole_engine() {
        let handle = EngineHandle::new(engine());
        let before = handle.current();
        let empty = GeoEngine::from_snapshot(
            Snapshot::default(),
            &CanonicalizeConfig::default(),
            MatchConfig::default(),
        )
        .unwrap();
        let previous = handle.replace(empty);

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.len(EntityKind::Region), 2);
        assert!(handle.current().is_empty());
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: Arc<RwLock<Vec<&'static str>>>,
    }

    impl CountingMetrics {
        fn snapshot(&self) -> Vec<&'static str> {
            self.events.read().unwrap().clone()
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_load(&self, _latency: Duration, result: Result<(), PipelineError>) {
            let label = if result.is_ok() { "load_ok" } else { "load_err" };
            self.events.write().unwrap().push(label);
        }

        fn record_query(&self, _latency: Duration, result: Result<(), MatchError>) {
            let label = if result.is_ok() { "query_ok" } else { "query_err" };
            self.events.write().unwrap().push(label);
        }

        fn record_projection(&self, _latency: Duration, result: Result<(), ProjectionError>) {
            let label = if result.is_ok() {
                "projection_ok"
            } else {
                "projection_err"
            };
            self.events.write().unwrap().push(label);
        }
    }

    #[test]
    fn metrics_recorder_tracks_pipeline_outcome() {
        let engine = engine();
        let metrics = Arc::new(CountingMetrics::default());
        set_pipeline_metrics(Some(metrics.clone()));

        let ok = SearchRequest::new(QueryRequest::new(EntityKind::Region).with_code("28"));
        assert!(engine.search(&ok).is_ok());
        let rejected = SearchRequest::new(QueryRequest::new(EntityKind::Region));
        assert!(engine.search(&rejected).is_err());
        let wrong_fields = engine.get(
            EntityKind::Region,
            "28",
            &FieldSet::default_for(EntityKind::Commune),
            OutputFormat::Json,
        );
        assert!(matches!(wrong_fields, Err(PipelineError::Projection(_))));

        set_pipeline_metrics(None);

        let events = metrics.snapshot();
        assert!(events.contains(&"query_ok"));
        assert!(events.contains(&"projection_ok"));
        assert!(events.contains(&"query_err"));
        assert!(events.contains(&"projection_err"));
    }
}
