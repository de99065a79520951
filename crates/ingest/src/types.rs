//! Snapshot record types.
//!
//! These are the three levels of the administrative hierarchy plus the
//! geometry attached to communes. Field names on the wire follow the dataset
//! files (`codesPostaux`, `codeDepartement`, ...); Rust names are snake_case.
//!
//! # Hierarchy
//!
//! ```text
//! Region ──< Departement ──< Commune
//!    └──────────────────────< Commune   (codeRegion, always present)
//! ```
//!
//! A commune's `code_departement` is optional (some special territories are
//! attached to a region only); every other foreign key is mandatory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three entity kinds of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Commune,
    Departement,
    Region,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Commune,
        EntityKind::Departement,
        EntityKind::Region,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Commune => "commune",
            EntityKind::Departement => "departement",
            EntityKind::Region => "region",
        }
    }

    /// Parent kinds a child of this kind can be listed under.
    pub fn parents(&self) -> &'static [EntityKind] {
        match self {
            EntityKind::Commune => &[EntityKind::Departement, EntityKind::Region],
            EntityKind::Departement => &[EntityKind::Region],
            EntityKind::Region => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commune" | "communes" => Ok(EntityKind::Commune),
            "departement" | "departements" => Ok(EntityKind::Departement),
            "region" | "regions" => Ok(EntityKind::Region),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// A `[longitude, latitude]` pair.
pub type Position = [f64; 2];

/// GeoJSON-shaped geometry.
///
/// Serialized with a `type` discriminator so a value can be dropped verbatim
/// into a GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point { .. })
    }

    pub fn is_areal(&self) -> bool {
        matches!(self, Geometry::Polygon { .. } | Geometry::MultiPolygon { .. })
    }
}

/// Top level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departement {
    pub code: String,
    pub nom: String,
    pub code_region: String,
}

/// Most granular level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commune {
    pub code: String,
    pub nom: String,
    /// Never empty once the snapshot has been validated.
    pub codes_postaux: Vec<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub code_departement: Option<String>,
    pub code_region: String,
    pub centre: Geometry,
    #[serde(default)]
    pub contour: Option<Geometry>,
    /// Area in km².
    #[serde(default)]
    pub surface: Option<f64>,
}

/// Everything the engine is built from, as loaded from the dataset files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub regions: Vec<Region>,
    pub departements: Vec<Departement>,
    pub communes: Vec<Commune>,
}

impl Snapshot {
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Commune => self.communes.len(),
            EntityKind::Departement => self.departements.len(),
            EntityKind::Region => self.regions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.departements.is_empty() && self.communes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commune_uses_dataset_field_names() {
        let json = r#"{
            "code": "55001",
            "nom": "Abainville",
            "codesPostaux": ["55130"],
            "population": 296,
            "codeDepartement": "55",
            "codeRegion": "44",
            "centre": { "type": "Point", "coordinates": [5.5, 48.53] }
        }"#;
        let commune: Commune = serde_json::from_str(json).expect("commune parses");
        assert_eq!(commune.codes_postaux, vec!["55130".to_string()]);
        assert_eq!(commune.code_departement.as_deref(), Some("55"));
        assert!(commune.centre.is_point());
        assert!(commune.contour.is_none());
        assert!(commune.surface.is_none());
    }

    #[test]
    fn geometry_carries_type_discriminator() {
        let geometry = Geometry::Point {
            coordinates: [2.35, 48.85],
        };
        let value = serde_json::to_value(&geometry).expect("serialize");
        assert_eq!(value["type"], "Point");
        assert_eq!(value["coordinates"][0], 2.35);
    }

    #[test]
    fn entity_kind_parses_singular_and_plural() {
        assert_eq!("regions".parse::<EntityKind>(), Ok(EntityKind::Region));
        assert_eq!("commune".parse::<EntityKind>(), Ok(EntityKind::Commune));
        assert!("canton".parse::<EntityKind>().is_err());
        assert_eq!(EntityKind::Departement.to_string(), "departement");
    }
}
