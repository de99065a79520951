//! Code-keyed and foreign-key-keyed lookup tables over the [`EntityStore`].
//!
//! Forward links (commune → departement → region) are resolved by code through
//! the code tables; reverse links (region → departements, departement →
//! communes, ...) are precomputed slot lists, one per parent slot. Nothing
//! here holds a pointer into another entity, so there is no ownership graph to
//! keep consistent.

use hashbrown::HashMap;
use ingest::EntityKind;

use crate::entity::Slot;
use crate::error::StoreBuildError;
use crate::store::EntityStore;

#[derive(Debug, Clone, Default)]
pub(crate) struct LookupTables {
    pub(crate) region_codes: HashMap<String, Slot>,
    pub(crate) departement_codes: HashMap<String, Slot>,
    pub(crate) commune_codes: HashMap<String, Slot>,
    /// Indexed by region slot.
    pub(crate) departements_by_region: Vec<Vec<Slot>>,
    /// Indexed by region slot.
    pub(crate) communes_by_region: Vec<Vec<Slot>>,
    /// Indexed by departement slot.
    pub(crate) communes_by_departement: Vec<Vec<Slot>>,
    pub(crate) communes_by_postal_code: HashMap<String, Vec<Slot>>,
}

impl LookupTables {
    pub(crate) fn codes(&self, kind: EntityKind) -> &HashMap<String, Slot> {
        match kind {
            EntityKind::Commune => &self.commune_codes,
            EntityKind::Departement => &self.departement_codes,
            EntityKind::Region => &self.region_codes,
        }
    }

    /// Builds every table and checks the cross-record invariants on the way.
    ///
    /// Slots are visited in ascending order, so every pushed child list comes
    /// out sorted by code without a separate sort pass.
    pub(crate) fn build(store: &EntityStore) -> Result<Self, StoreBuildError> {
        let region_codes = code_table(
            EntityKind::Region,
            store.regions().iter().map(|r| r.code.as_str()),
        )?;
        let departement_codes = code_table(
            EntityKind::Departement,
            store.departements().iter().map(|d| d.code.as_str()),
        )?;
        let commune_codes = code_table(
            EntityKind::Commune,
            store.communes().iter().map(|c| c.code.as_str()),
        )?;

        let mut departements_by_region = vec![Vec::new(); store.regions().len()];
        for (slot, departement) in store.departements().iter().enumerate() {
            let Some(&region_slot) = region_codes.get(departement.code_region.as_str()) else {
                return Err(StoreBuildError::DanglingReference {
                    kind: EntityKind::Departement,
                    code: departement.code.clone(),
                    field: "codeRegion",
                    target: format!("region {}", departement.code_region),
                });
            };
            departements_by_region[region_slot].push(slot);
        }

        let mut communes_by_region = vec![Vec::new(); store.regions().len()];
        let mut communes_by_departement = vec![Vec::new(); store.departements().len()];
        let mut communes_by_postal_code: HashMap<String, Vec<Slot>> = HashMap::new();

        for (slot, commune) in store.communes().iter().enumerate() {
            let Some(&region_slot) = region_codes.get(commune.code_region.as_str()) else {
                return Err(StoreBuildError::DanglingReference {
                    kind: EntityKind::Commune,
                    code: commune.code.clone(),
                    field: "codeRegion",
                    target: format!("region {}", commune.code_region),
                });
            };
            communes_by_region[region_slot].push(slot);

            if let Some(code_departement) = &commune.code_departement {
                let Some(&departement_slot) = departement_codes.get(code_departement.as_str())
                else {
                    return Err(StoreBuildError::DanglingReference {
                        kind: EntityKind::Commune,
                        code: commune.code.clone(),
                        field: "codeDepartement",
                        target: format!("departement {code_departement}"),
                    });
                };
                let departement = &store.departements()[departement_slot];
                if departement.code_region != commune.code_region {
                    return Err(StoreBuildError::InconsistentRegion {
                        code: commune.code.clone(),
                        departement: departement.code.clone(),
                        expected: departement.code_region.clone(),
                        found: commune.code_region.clone(),
                    });
                }
                communes_by_departement[departement_slot].push(slot);
            }

            if commune.codes_postaux.is_empty() {
                return Err(StoreBuildError::EmptyPostalCodes {
                    code: commune.code.clone(),
                });
            }
            for postal in &commune.codes_postaux {
                let slots = communes_by_postal_code.entry(postal.clone()).or_default();
                // A commune listing the same postal code twice must not appear twice.
                if slots.last() != Some(&slot) {
                    slots.push(slot);
                }
            }
        }

        Ok(Self {
            region_codes,
            departement_codes,
            commune_codes,
            departements_by_region,
            communes_by_region,
            communes_by_departement,
            communes_by_postal_code,
        })
    }
}

fn code_table<'a>(
    kind: EntityKind,
    codes: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, Slot>, StoreBuildError> {
    let mut table = HashMap::new();
    for (slot, code) in codes.enumerate() {
        if table.insert(code.to_string(), slot).is_some() {
            return Err(StoreBuildError::DuplicateCode {
                kind,
                code: code.to_string(),
            });
        }
    }
    Ok(table)
}
