use ingest::{Commune, Departement, EntityKind, Region, Snapshot};

use crate::entity::{Entity, Slot};

/// Immutable arenas of the three entity kinds, each sorted by code.
///
/// Built once from a [`Snapshot`]; nothing is inserted, mutated or removed
/// afterwards, which is what lets any number of readers share it without
/// locking.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    regions: Vec<Region>,
    departements: Vec<Departement>,
    communes: Vec<Commune>,
}

impl EntityStore {
    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            mut regions,
            mut departements,
            mut communes,
        } = snapshot;

        regions.sort_by(|a, b| a.code.cmp(&b.code));
        departements.sort_by(|a, b| a.code.cmp(&b.code));
        communes.sort_by(|a, b| a.code.cmp(&b.code));

        Self {
            regions,
            departements,
            communes,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn departements(&self) -> &[Departement] {
        &self.departements
    }

    pub fn communes(&self) -> &[Commune] {
        &self.communes
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Commune => self.communes.len(),
            EntityKind::Departement => self.departements.len(),
            EntityKind::Region => self.regions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    pub fn entity(&self, kind: EntityKind, slot: Slot) -> Option<Entity<'_>> {
        match kind {
            EntityKind::Commune => self.communes.get(slot).map(Entity::Commune),
            EntityKind::Departement => self.departements.get(slot).map(Entity::Departement),
            EntityKind::Region => self.regions.get(slot).map(Entity::Region),
        }
    }

    /// Every entity of `kind`, ascending by code.
    pub fn iter(&self, kind: EntityKind) -> impl Iterator<Item = Entity<'_>> + '_ {
        (0..self.len(kind)).filter_map(move |slot| self.entity(kind, slot))
    }
}
