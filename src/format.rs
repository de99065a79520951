//! Output formats: flat JSON records or GeoJSON features.

use std::fmt;
use std::str::FromStr;

use index::{Entity, GeoIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::project::{FieldSet, Record, geometry_value, project, project_properties};

/// Key added to a record or feature properties when a fuzzy name match
/// produced it.
pub const SCORE_KEY: &str = "_score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    GeoJson,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::GeoJson => "geojson",
        }
    }

    /// `None` means the default, flat JSON.
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, FormatError> {
        raw.map_or(Ok(OutputFormat::Json), str::parse)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "json" => Ok(OutputFormat::Json),
            "geojson" => Ok(OutputFormat::GeoJson),
            other => Err(FormatError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported format {0:?}, expected \"json\" or \"geojson\"")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Record,
    pub geometry: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

/// A rendered response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Records(Vec<Record>),
    Record(Record),
    FeatureCollection(FeatureCollection),
    Feature(Feature),
}

impl Payload {
    /// Number of records or features.
    pub fn len(&self) -> usize {
        match self {
            Payload::Records(records) => records.len(),
            Payload::FeatureCollection(collection) => collection.features.len(),
            Payload::Record(_) | Payload::Feature(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Renders one entity as a flat record.
pub(crate) fn record(
    index: &GeoIndex,
    entity: Entity<'_>,
    fields: &FieldSet,
    score: Option<f64>,
) -> Record {
    let mut record = project(index, entity, fields);
    if let Some(score) = score {
        record.insert(SCORE_KEY.to_string(), Value::from(score));
    }
    record
}

/// Renders one entity as a GeoJSON feature.
///
/// The geometry is the commune contour when known, else its centre; other
/// kinds carry no geometry. Geometry fields never appear in properties.
pub(crate) fn feature(
    index: &GeoIndex,
    entity: Entity<'_>,
    fields: &FieldSet,
    score: Option<f64>,
) -> Feature {
    let mut properties = project_properties(index, entity, fields);
    if let Some(score) = score {
        properties.insert(SCORE_KEY.to_string(), Value::from(score));
    }
    let geometry = entity
        .as_commune()
        .map(|c| geometry_value(c.contour.as_ref().or(Some(&c.centre))))
        .unwrap_or(Value::Null);
    Feature {
        kind: "Feature".to_string(),
        properties,
        geometry,
    }
}

/// Renders a list of entities in `format`.
pub(crate) fn render_list<'a>(
    index: &'a GeoIndex,
    entities: impl Iterator<Item = (Entity<'a>, Option<f64>)>,
    fields: &FieldSet,
    format: OutputFormat,
) -> Payload {
    match format {
        OutputFormat::Json => Payload::Records(
            entities
                .map(|(entity, score)| record(index, entity, fields, score))
                .collect(),
        ),
        OutputFormat::GeoJson => Payload::FeatureCollection(FeatureCollection::new(
            entities
                .map(|(entity, score)| feature(index, entity, fields, score))
                .collect(),
        )),
    }
}

/// Renders a single entity in `format`.
pub(crate) fn render_one(
    index: &GeoIndex,
    entity: Entity<'_>,
    fields: &FieldSet,
    format: OutputFormat,
) -> Payload {
    match format {
        OutputFormat::Json => Payload::Record(record(index, entity, fields, None)),
        OutputFormat::GeoJson => Payload::Feature(feature(index, entity, fields, None)),
    }
}
