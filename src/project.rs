//! Field selection and record projection.
//!
//! A [`FieldSet`] is the validated list of output fields for one entity kind.
//! [`project`] turns an entity into a JSON object holding exactly those
//! fields, resolving `departement` and `region` summaries through the index.

use std::fmt;
use std::str::FromStr;

use index::{Entity, GeoIndex};
use ingest::{Commune, EntityKind, Geometry};
use serde_json::{Map, Value, json};

/// Output record, keys in requested order.
pub type Record = Map<String, Value>;

/// Every output field the service knows, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Code,
    Nom,
    CodesPostaux,
    Centre,
    Contour,
    Surface,
    Population,
    CodeDepartement,
    CodeRegion,
    Departement,
    Region,
}

const COMMUNE_SCHEMA: &[Field] = &[
    Field::Code,
    Field::Nom,
    Field::CodesPostaux,
    Field::Centre,
    Field::Contour,
    Field::Surface,
    Field::Population,
    Field::CodeDepartement,
    Field::CodeRegion,
    Field::Departement,
    Field::Region,
];
const DEPARTEMENT_SCHEMA: &[Field] = &[Field::Code, Field::Nom, Field::CodeRegion, Field::Region];
const REGION_SCHEMA: &[Field] = &[Field::Code, Field::Nom];

const COMMUNE_DEFAULTS: &[Field] = &[
    Field::Code,
    Field::Nom,
    Field::CodesPostaux,
    Field::Population,
    Field::CodeDepartement,
    Field::CodeRegion,
];
const DEPARTEMENT_DEFAULTS: &[Field] = &[Field::Code, Field::Nom, Field::CodeRegion];
const REGION_DEFAULTS: &[Field] = REGION_SCHEMA;

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Code => "code",
            Field::Nom => "nom",
            Field::CodesPostaux => "codesPostaux",
            Field::Centre => "centre",
            Field::Contour => "contour",
            Field::Surface => "surface",
            Field::Population => "population",
            Field::CodeDepartement => "codeDepartement",
            Field::CodeRegion => "codeRegion",
            Field::Departement => "departement",
            Field::Region => "region",
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, Field::Centre | Field::Contour)
    }

    /// Fields an entity of `kind` can be projected to.
    pub fn schema(kind: EntityKind) -> &'static [Field] {
        match kind {
            EntityKind::Commune => COMMUNE_SCHEMA,
            EntityKind::Departement => DEPARTEMENT_SCHEMA,
            EntityKind::Region => REGION_SCHEMA,
        }
    }

    /// Fields returned when the caller asks for none.
    pub fn defaults(kind: EntityKind) -> &'static [Field] {
        match kind {
            EntityKind::Commune => COMMUNE_DEFAULTS,
            EntityKind::Departement => DEPARTEMENT_DEFAULTS,
            EntityKind::Region => REGION_DEFAULTS,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COMMUNE_SCHEMA
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or(())
    }
}

/// Errors raised while selecting or projecting fields.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("unknown field {field:?} for {kind}")]
    UnknownField { kind: EntityKind, field: String },
    #[error("field set built for {found} used to project {expected}")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },
}

/// Validated, deduplicated output fields for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    kind: EntityKind,
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn default_for(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: Field::defaults(kind).to_vec(),
        }
    }

    /// Every field of the kind's schema.
    pub fn all(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: Field::schema(kind).to_vec(),
        }
    }

    /// Parses a comma-separated field list.
    ///
    /// Items are trimmed, empty items are skipped and repeats keep their first
    /// position. A list with no items yields the default set.
    pub fn parse(kind: EntityKind, raw: &str) -> Result<Self, ProjectionError> {
        let names = raw.split(',').map(str::trim).filter(|name| !name.is_empty());
        Self::from_names(kind, names)
    }

    /// Like [`FieldSet::parse`], with `None` meaning the default set.
    pub fn parse_optional(kind: EntityKind, raw: Option<&str>) -> Result<Self, ProjectionError> {
        match raw {
            Some(raw) => Self::parse(kind, raw),
            None => Ok(Self::default_for(kind)),
        }
    }

    pub fn from_names<'a>(
        kind: EntityKind,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ProjectionError> {
        let schema = Field::schema(kind);
        let mut fields = Vec::new();
        for name in names {
            let field = name
                .parse::<Field>()
                .ok()
                .filter(|field| schema.contains(field))
                .ok_or_else(|| ProjectionError::UnknownField {
                    kind,
                    field: name.to_string(),
                })?;
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        if fields.is_empty() {
            return Ok(Self::default_for(kind));
        }
        Ok(Self { kind, fields })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub(crate) fn ensure_kind(&self, expected: EntityKind) -> Result<(), ProjectionError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ProjectionError::KindMismatch {
                expected,
                found: self.kind,
            })
        }
    }
}

/// Projects `entity` onto `fields`.
///
/// The record holds exactly the requested keys, in order. Absent optional
/// values become `null`.
pub fn project(index: &GeoIndex, entity: Entity<'_>, fields: &FieldSet) -> Record {
    project_filtered(index, entity, fields, |_| true)
}

/// Like [`project`], skipping geometry fields.
pub(crate) fn project_properties(index: &GeoIndex, entity: Entity<'_>, fields: &FieldSet) -> Record {
    project_filtered(index, entity, fields, |field| !field.is_geometry())
}

fn project_filtered(
    index: &GeoIndex,
    entity: Entity<'_>,
    fields: &FieldSet,
    keep: impl Fn(Field) -> bool,
) -> Record {
    let mut record = Map::with_capacity(fields.fields.len());
    for &field in fields.fields.iter().filter(|&&field| keep(field)) {
        record.insert(field.as_str().to_string(), field_value(index, entity, field));
    }
    record
}

fn field_value(index: &GeoIndex, entity: Entity<'_>, field: Field) -> Value {
    match field {
        Field::Code => Value::from(entity.code()),
        Field::Nom => Value::from(entity.nom()),
        Field::CodeRegion => match entity {
            Entity::Commune(c) => Value::from(c.code_region.as_str()),
            Entity::Departement(d) => Value::from(d.code_region.as_str()),
            Entity::Region(_) => Value::Null,
        },
        Field::Region => match entity {
            Entity::Region(_) => Value::Null,
            other => index
                .region_of(other)
                .map(|r| summary(&r.code, &r.nom))
                .unwrap_or(Value::Null),
        },
        Field::Departement => entity
            .as_commune()
            .and_then(|c| index.departement_of(c))
            .map(|d| summary(&d.code, &d.nom))
            .unwrap_or(Value::Null),
        _ => entity
            .as_commune()
            .map(|c| commune_value(c, field))
            .unwrap_or(Value::Null),
    }
}

fn commune_value(commune: &Commune, field: Field) -> Value {
    match field {
        Field::CodesPostaux => Value::from(commune.codes_postaux.clone()),
        Field::Centre => geometry_value(Some(&commune.centre)),
        Field::Contour => geometry_value(commune.contour.as_ref()),
        Field::Surface => commune.surface.map(Value::from).unwrap_or(Value::Null),
        Field::Population => commune.population.map(Value::from).unwrap_or(Value::Null),
        Field::CodeDepartement => commune
            .code_departement
            .as_deref()
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn summary(code: &str, nom: &str) -> Value {
    json!({ "code": code, "nom": nom })
}

pub(crate) fn geometry_value(geometry: Option<&Geometry>) -> Value {
    geometry
        .and_then(|g| serde_json::to_value(g).ok())
        .unwrap_or(Value::Null)
}
