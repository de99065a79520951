//! # Geo Index
//!
//! The immutable entity store and exact-match lookup tables the query engine
//! runs on.
//!
//! ## Core Features
//!
//! - **Arena store**: one `Vec` per entity kind, sorted by code once at build
//!   time. Entities are addressed by [`Slot`] (position), never by pointer.
//! - **Code lookup**: O(1) `code → slot` tables per kind.
//! - **Reverse traversal**: precomputed child lists (region → departements,
//!   region → communes, departement → communes), O(children) to enumerate and
//!   always in ascending code order.
//! - **Postal codes**: `postal code → communes`; a postal code shared by several
//!   communes returns all of them.
//! - **Build-time validation**: duplicate codes and dangling foreign keys fail
//!   the build with a [`StoreBuildError`]. Nothing is checked at query time
//!   because nothing can change after the build.
//!
//! ## Example Usage
//!
//! ```
//! use index::GeoIndex;
//! use ingest::{EntityKind, Region, Departement, Snapshot};
//!
//! let snapshot = Snapshot {
//!     regions: vec![Region { code: "28".into(), nom: "Normandie".into() }],
//!     departements: vec![Departement {
//!         code: "27".into(),
//!         nom: "Eure".into(),
//!         code_region: "28".into(),
//!     }],
//!     communes: vec![],
//! };
//! let index = GeoIndex::build(snapshot).unwrap();
//!
//! assert_eq!(index.by_code(EntityKind::Region, "28").unwrap().nom(), "Normandie");
//! let children = index.children_of(EntityKind::Region, "28", EntityKind::Departement).unwrap();
//! assert_eq!(children.len(), 1);
//! assert!(index.children_of(EntityKind::Region, "666", EntityKind::Departement).is_err());
//! ```

mod entity;
mod error;
mod lookup;
mod store;

use std::time::Instant;

use ingest::{Commune, Departement, EntityKind, Region, Snapshot};

use crate::lookup::LookupTables;

pub use crate::entity::{Children, Entity, Slot};
pub use crate::error::{LookupError, StoreBuildError};
pub use crate::store::EntityStore;

/// Entity store plus its lookup tables. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct GeoIndex {
    store: EntityStore,
    tables: LookupTables,
}

impl GeoIndex {
    /// Build the store and every lookup table from a snapshot.
    pub fn build(snapshot: Snapshot) -> Result<Self, StoreBuildError> {
        let start = Instant::now();
        let store = EntityStore::from_snapshot(snapshot);
        let tables = match LookupTables::build(&store) {
            Ok(tables) => tables,
            Err(err) => {
                log::error!("index build failed: {err}");
                return Err(err);
            }
        };

        log::info!(
            "index built: {} regions, {} departements, {} communes, {} postal codes in {}us",
            store.regions().len(),
            store.departements().len(),
            store.communes().len(),
            tables.communes_by_postal_code.len(),
            start.elapsed().as_micros()
        );

        Ok(Self { store, tables })
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Total number of entities of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.store.len(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Slot of the entity with this code, if any.
    pub fn position(&self, kind: EntityKind, code: &str) -> Option<Slot> {
        self.tables.codes(kind).get(code).copied()
    }

    pub fn entity(&self, kind: EntityKind, slot: Slot) -> Option<Entity<'_>> {
        self.store.entity(kind, slot)
    }

    /// Zero or one entity. A missing code is not an error at this layer.
    pub fn by_code(&self, kind: EntityKind, code: &str) -> Option<Entity<'_>> {
        self.position(kind, code)
            .and_then(|slot| self.store.entity(kind, slot))
    }

    pub fn region(&self, code: &str) -> Option<&Region> {
        self.position(EntityKind::Region, code)
            .and_then(|slot| self.store.regions().get(slot))
    }

    pub fn departement(&self, code: &str) -> Option<&Departement> {
        self.position(EntityKind::Departement, code)
            .and_then(|slot| self.store.departements().get(slot))
    }

    pub fn commune(&self, code: &str) -> Option<&Commune> {
        self.position(EntityKind::Commune, code)
            .and_then(|slot| self.store.communes().get(slot))
    }

    /// Every entity of `kind`, ascending by code.
    pub fn all(&self, kind: EntityKind) -> impl Iterator<Item = Entity<'_>> + '_ {
        self.store.iter(kind)
    }

    /// Children of `child` kind under the `parent` entity with `parent_code`.
    ///
    /// An unknown parent is [`LookupError::ParentNotFound`]; a known parent
    /// without children is an empty [`Children`].
    pub fn children_of(
        &self,
        parent: EntityKind,
        parent_code: &str,
        child: EntityKind,
    ) -> Result<Children<'_>, LookupError> {
        let slots_by_parent = match (parent, child) {
            (EntityKind::Region, EntityKind::Departement) => &self.tables.departements_by_region,
            (EntityKind::Region, EntityKind::Commune) => &self.tables.communes_by_region,
            (EntityKind::Departement, EntityKind::Commune) => {
                &self.tables.communes_by_departement
            }
            _ => return Err(LookupError::InvalidHierarchy { parent, child }),
        };

        let not_found = || LookupError::ParentNotFound {
            kind: parent,
            code: parent_code.to_string(),
        };
        let parent_slot = self.position(parent, parent_code).ok_or_else(not_found)?;
        let parent_entity = self.store.entity(parent, parent_slot).ok_or_else(not_found)?;

        Ok(Children {
            parent: parent_entity,
            kind: child,
            slots: slots_by_parent
                .get(parent_slot)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            store: &self.store,
        })
    }

    /// Slots of every commune carrying `postal_code`, ascending by code.
    pub fn postal_code_slots(&self, postal_code: &str) -> &[Slot] {
        self.tables
            .communes_by_postal_code
            .get(postal_code)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every commune carrying `postal_code`. Unknown postal codes yield an
    /// empty list.
    pub fn by_postal_code(&self, postal_code: &str) -> Vec<&Commune> {
        let communes = self.store.communes();
        self.postal_code_slots(postal_code)
            .iter()
            .filter_map(|&slot| communes.get(slot))
            .collect()
    }

    /// Parent departement of a commune, resolved through the code table.
    pub fn departement_of(&self, commune: &Commune) -> Option<&Departement> {
        commune
            .code_departement
            .as_deref()
            .and_then(|code| self.departement(code))
    }

    /// Region of a commune or a departement.
    pub fn region_of(&self, entity: Entity<'_>) -> Option<&Region> {
        match entity {
            Entity::Commune(c) => self.region(&c.code_region),
            Entity::Departement(d) => self.region(&d.code_region),
            Entity::Region(r) => self.region(&r.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::Geometry;

    fn region(code: &str, nom: &str) -> Region {
        Region {
            code: code.into(),
            nom: nom.into(),
        }
    }

    fn departement(code: &str, nom: &str, code_region: &str) -> Departement {
        Departement {
            code: code.into(),
            nom: nom.into(),
            code_region: code_region.into(),
        }
    }

    fn commune(code: &str, nom: &str, postal: &[&str], dep: Option<&str>, reg: &str) -> Commune {
        Commune {
            code: code.into(),
            nom: nom.into(),
            codes_postaux: postal.iter().map(|p| p.to_string()).collect(),
            population: Some(100),
            code_departement: dep.map(str::to_string),
            code_region: reg.into(),
            centre: Geometry::Point {
                coordinates: [5.0, 48.0],
            },
            contour: None,
            surface: None,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            regions: vec![region("44", "Grand Est"), region("28", "Normandie")],
            departements: vec![
                departement("55", "Meuse", "44"),
                departement("27", "Eure", "28"),
                departement("14", "Calvados", "28"),
                departement("54", "Meurthe-et-Moselle", "44"),
            ],
            communes: vec![
                commune("55215", "Gondrecourt-le-Château", &["55130"], Some("55"), "44"),
                commune("55001", "Abainville", &["55130"], Some("55"), "44"),
                commune("27229", "Évreux", &["27000"], Some("27"), "28"),
                commune("54099", "Bréménil", &["54540", "54540"], Some("54"), "44"),
            ],
        }
    }

    fn index() -> GeoIndex {
        GeoIndex::build(snapshot()).expect("index builds")
    }

    #[test]
    fn by_code_returns_exactly_one_entity() {
        let index = index();
        for kind in EntityKind::ALL {
            for entity in index.all(kind).collect::<Vec<_>>() {
                let found = index.by_code(kind, entity.code()).expect("code resolves");
                assert_eq!(found.code(), entity.code());
                assert_eq!(found.kind(), kind);
            }
        }
        assert!(index.by_code(EntityKind::Commune, "99999").is_none());
    }

    #[test]
    fn arenas_are_sorted_by_code() {
        let index = index();
        let codes: Vec<&str> = index.all(EntityKind::Departement).map(|e| e.code()).collect();
        assert_eq!(codes, vec!["14", "27", "54", "55"]);
    }

    #[test]
    fn children_are_ascending_and_exact() {
        let index = index();
        let children = index
            .children_of(EntityKind::Region, "44", EntityKind::Departement)
            .expect("region exists");
        let codes: Vec<&str> = children.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["54", "55"]);
        assert_eq!(children.parent().nom(), "Grand Est");

        let communes = index
            .children_of(EntityKind::Departement, "55", EntityKind::Commune)
            .expect("departement exists");
        let codes: Vec<&str> = communes.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["55001", "55215"]);
    }

    #[test]
    fn unknown_parent_differs_from_empty_children() {
        let index = index();
        let empty = index
            .children_of(EntityKind::Departement, "14", EntityKind::Commune)
            .expect("calvados exists");
        assert!(empty.is_empty());

        let err = index
            .children_of(EntityKind::Region, "666", EntityKind::Departement)
            .expect_err("unknown region");
        assert_eq!(
            err,
            LookupError::ParentNotFound {
                kind: EntityKind::Region,
                code: "666".into()
            }
        );
    }

    #[test]
    fn invalid_hierarchy_rejected() {
        let err = index()
            .children_of(EntityKind::Commune, "55001", EntityKind::Region)
            .expect_err("communes have no children");
        assert!(matches!(err, LookupError::InvalidHierarchy { .. }));
    }

    #[test]
    fn shared_postal_code_returns_all_communes() {
        let index = index();
        let names: Vec<&str> = index
            .by_postal_code("55130")
            .iter()
            .map(|c| c.nom.as_str())
            .collect();
        assert_eq!(names, vec!["Abainville", "Gondrecourt-le-Château"]);
        assert_eq!(index.postal_code_slots("54540").len(), 1);
        assert!(index.by_postal_code("00000").is_empty());
    }

    #[test]
    fn foreign_keys_resolve() {
        let index = index();
        let commune = index.commune("27229").expect("evreux");
        assert_eq!(index.departement_of(commune).map(|d| d.nom.as_str()), Some("Eure"));
        assert_eq!(
            index.region_of(Entity::Commune(commune)).map(|r| r.nom.as_str()),
            Some("Normandie")
        );
    }

    #[test]
    fn commune_without_departement_is_listed_under_region_only() {
        let mut snapshot = snapshot();
        snapshot
            .communes
            .push(commune("44999", "Territoire", &["44999"], None, "44"));
        let index = GeoIndex::build(snapshot).expect("builds");
        let commune = index.commune("44999").expect("present");
        assert!(index.departement_of(commune).is_none());
        let under_region = index
            .children_of(EntityKind::Region, "44", EntityKind::Commune)
            .expect("region exists");
        assert!(under_region.iter().any(|e| e.code() == "44999"));
    }

    #[test]
    fn duplicate_code_fails_build() {
        let mut snapshot = snapshot();
        snapshot.regions.push(region("28", "Normandie bis"));
        let err = GeoIndex::build(snapshot).expect_err("duplicate");
        assert!(matches!(err, StoreBuildError::DuplicateCode { kind: EntityKind::Region, .. }));
    }

    #[test]
    fn dangling_reference_fails_build() {
        let mut snapshot = snapshot();
        snapshot.departements.push(departement("99", "Nowhere", "00"));
        let err = GeoIndex::build(snapshot).expect_err("dangling");
        assert!(matches!(
            err,
            StoreBuildError::DanglingReference { field: "codeRegion", .. }
        ));
    }

    #[test]
    fn inconsistent_region_fails_build() {
        let mut snapshot = snapshot();
        snapshot
            .communes
            .push(commune("27001", "Misfiled", &["27000"], Some("27"), "44"));
        let err = GeoIndex::build(snapshot).expect_err("inconsistent");
        assert!(matches!(err, StoreBuildError::InconsistentRegion { .. }));
    }

    #[test]
    fn empty_postal_codes_fail_build() {
        let mut snapshot = snapshot();
        snapshot.communes.push(commune("55002", "Empty", &[], Some("55"), "44"));
        let err = GeoIndex::build(snapshot).expect_err("no postal code");
        assert_eq!(
            err,
            StoreBuildError::EmptyPostalCodes {
                code: "55002".into()
            }
        );
    }
}
