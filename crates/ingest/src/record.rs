//! Per-record sanitization and validation.
//!
//! Codes are trimmed (and optionally stripped of control characters) but never
//! renormalized: "01" stays "01", "2A" stays "2A".

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::types::{Commune, Departement, EntityKind, Region};

/// Trims and optionally strips control characters; `None` when nothing is left.
pub(crate) fn sanitize_optional_string(value: Option<String>, strip_control: bool) -> Option<String> {
    value.and_then(|raw| {
        let filtered = if strip_control {
            raw.chars().filter(|c| !c.is_control()).collect::<String>()
        } else {
            raw
        };
        let trimmed = filtered.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == filtered.len() {
            Some(filtered)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn sanitize_required_field(
    kind: EntityKind,
    index: usize,
    field: &str,
    value: String,
    strip_control: bool,
) -> Result<String, IngestError> {
    sanitize_optional_string(Some(value), strip_control).ok_or_else(|| IngestError::InvalidRecord {
        kind,
        index,
        reason: format!("{field} empty"),
    })
}

pub(crate) fn normalize_region(
    index: usize,
    region: Region,
    cfg: &IngestConfig,
) -> Result<Region, IngestError> {
    let kind = EntityKind::Region;
    let strip = cfg.strip_control_chars;
    Ok(Region {
        code: sanitize_required_field(kind, index, "code", region.code, strip)?,
        nom: sanitize_required_field(kind, index, "nom", region.nom, strip)?,
    })
}

pub(crate) fn normalize_departement(
    index: usize,
    departement: Departement,
    cfg: &IngestConfig,
) -> Result<Departement, IngestError> {
    let kind = EntityKind::Departement;
    let strip = cfg.strip_control_chars;
    Ok(Departement {
        code: sanitize_required_field(kind, index, "code", departement.code, strip)?,
        nom: sanitize_required_field(kind, index, "nom", departement.nom, strip)?,
        code_region: sanitize_required_field(
            kind,
            index,
            "codeRegion",
            departement.code_region,
            strip,
        )?,
    })
}

pub(crate) fn normalize_commune(
    index: usize,
    commune: Commune,
    cfg: &IngestConfig,
) -> Result<Commune, IngestError> {
    let kind = EntityKind::Commune;
    let strip = cfg.strip_control_chars;
    let invalid = |reason: String| IngestError::InvalidRecord {
        kind,
        index,
        reason,
    };

    let code = sanitize_required_field(kind, index, "code", commune.code, strip)?;
    let nom = sanitize_required_field(kind, index, "nom", commune.nom, strip)?;

    if commune.codes_postaux.is_empty() {
        return Err(invalid(format!("{code}: codesPostaux empty")));
    }
    let mut codes_postaux = Vec::with_capacity(commune.codes_postaux.len());
    for postal in commune.codes_postaux {
        let Some(postal) = sanitize_optional_string(Some(postal), strip) else {
            return Err(invalid(format!("{code}: blank postal code")));
        };
        if !codes_postaux.contains(&postal) {
            codes_postaux.push(postal);
        }
    }

    if !commune.centre.is_point() {
        return Err(invalid(format!(
            "{code}: centre must be a Point, got {}",
            commune.centre.type_name()
        )));
    }
    if let Some(contour) = &commune.contour {
        if !contour.is_areal() {
            return Err(invalid(format!(
                "{code}: contour must be a Polygon or MultiPolygon, got {}",
                contour.type_name()
            )));
        }
    }
    if let Some(surface) = commune.surface {
        if !(surface > 0.0 && surface.is_finite()) {
            return Err(invalid(format!("{code}: surface must be positive")));
        }
    }

    Ok(Commune {
        code,
        nom,
        codes_postaux,
        population: commune.population,
        code_departement: sanitize_optional_string(commune.code_departement, strip),
        code_region: sanitize_required_field(kind, index, "codeRegion", commune.code_region, strip)?,
        centre: commune.centre,
        contour: commune.contour,
        surface: commune.surface,
    })
}
