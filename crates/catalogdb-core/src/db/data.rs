use crate::{db::ParentStamp, types::EntityId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, btree_map};

///
/// Record
///
/// A committed entity together with its store-assigned id, as handed to
/// readers. Serializes flat: `id` next to the entity's own fields.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Record<E> {
    pub id: EntityId,
    #[serde(flatten)]
    pub entity: E,
}

impl<E> Record<E> {
    #[must_use]
    pub const fn new(id: EntityId, entity: E) -> Self {
        Self { id, entity }
    }
}

///
/// Row
///
/// Stored form of one record. `version` starts at 1 and increases on every
/// committed update; children copy it into their `ParentStamp`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row<E> {
    entity: E,
    version: u64,
    parent_stamp: Option<ParentStamp>,
}

impl<E> Row<E> {
    pub(crate) const fn new(entity: E, version: u64, parent_stamp: Option<ParentStamp>) -> Self {
        Self {
            entity,
            version,
            parent_stamp,
        }
    }

    #[must_use]
    pub const fn entity(&self) -> &E {
        &self.entity
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Parent snapshot this row copied at its last write, if it has a parent.
    #[must_use]
    pub const fn parent_stamp(&self) -> Option<ParentStamp> {
        self.parent_stamp
    }
}

///
/// DataStore
///
/// Committed rows of one collection keyed by id. Iteration order is id
/// order, which is insertion order.
///

#[derive(Clone, Debug)]
pub struct DataStore<E> {
    rows: BTreeMap<EntityId, Row<E>>,
}

impl<E> Default for DataStore<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<E> DataStore<E> {
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Row<E>> {
        self.rows.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.rows.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, EntityId, Row<E>> {
        self.rows.iter()
    }

    pub(crate) fn insert(&mut self, id: EntityId, row: Row<E>) -> Option<Row<E>> {
        self.rows.insert(id, row)
    }

    pub(crate) fn remove(&mut self, id: &EntityId) -> Option<Row<E>> {
        self.rows.remove(id)
    }
}

impl<E: Clone> DataStore<E> {
    /// Clone one committed row out as a reader-facing record.
    #[must_use]
    pub fn record(&self, id: &EntityId) -> Option<Record<E>> {
        self.get(id)
            .map(|row| Record::new(*id, row.entity().clone()))
    }
}
