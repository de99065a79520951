use ingest::{Commune, Departement, EntityKind, Region};

/// Position of an entity in its kind's arena. Arenas are sorted by code, so
/// ascending slots mean ascending codes.
pub type Slot = usize;

/// A borrowed entity of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity<'a> {
    Commune(&'a Commune),
    Departement(&'a Departement),
    Region(&'a Region),
}

impl<'a> Entity<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Commune(_) => EntityKind::Commune,
            Entity::Departement(_) => EntityKind::Departement,
            Entity::Region(_) => EntityKind::Region,
        }
    }

    pub fn code(&self) -> &'a str {
        match self {
            Entity::Commune(c) => &c.code,
            Entity::Departement(d) => &d.code,
            Entity::Region(r) => &r.code,
        }
    }

    pub fn nom(&self) -> &'a str {
        match self {
            Entity::Commune(c) => &c.nom,
            Entity::Departement(d) => &d.nom,
            Entity::Region(r) => &r.nom,
        }
    }

    pub fn as_commune(&self) -> Option<&'a Commune> {
        match self {
            Entity::Commune(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_departement(&self) -> Option<&'a Departement> {
        match self {
            Entity::Departement(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_region(&self) -> Option<&'a Region> {
        match self {
            Entity::Region(r) => Some(r),
            _ => None,
        }
    }
}

/// Children of one parent, in ascending code order.
#[derive(Debug, Clone, Copy)]
pub struct Children<'a> {
    pub(crate) parent: Entity<'a>,
    pub(crate) kind: EntityKind,
    pub(crate) slots: &'a [Slot],
    pub(crate) store: &'a crate::EntityStore,
}

impl<'a> Children<'a> {
    pub fn parent(&self) -> Entity<'a> {
        self.parent
    }

    /// Kind of the listed children.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn slots(&self) -> &'a [Slot] {
        self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity<'a>> + 'a {
        let store = self.store;
        let kind = self.kind;
        self.slots
            .iter()
            .filter_map(move |&slot| store.entity(kind, slot))
    }
}
