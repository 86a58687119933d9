//! Module: db
//! Responsibility: the catalog store composition root and its collections.
//! Does not own: query planning (`query`) or entity rules (`entity`).
//! Boundary: every read and write goes through `CatalogStore`, which holds
//! one lock over all collections so a terminal write can read operators
//! while it is prepared.

mod collection;
pub(crate) mod commit;
mod data;
mod hub;
mod relation;
mod settings;
#[cfg(test)]
mod tests;

pub use collection::Collection;
pub use commit::{BatchOp, BatchReceipt};
pub use data::{DataStore, Record, Row};
pub use hub::{Snapshot, Subscription, SubscriptionHub, SubscriptionState};
pub(crate) use relation::materialize;
pub use relation::{ParentStamp, ReadPolicy, TerminalReader, TerminalView};

use crate::{
    config::CatalogConfig,
    entity::{Advertisement, Facility, Operator, Terminal},
    error::CatalogError,
    traits::EntityKind,
    types::EntityId,
};
use serde::Serialize;
use settings::SettingsState;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

///
/// CollectionState
///
/// Rows, revision counter and subscription hub of one collection.
///

#[derive(Debug)]
pub struct CollectionState<E: EntityKind> {
    pub(crate) rows: DataStore<E>,
    pub(crate) revision: u64,
    pub(crate) hub: Arc<SubscriptionHub<E>>,
}

impl<E: EntityKind> Default for CollectionState<E> {
    fn default() -> Self {
        Self {
            rows: DataStore::default(),
            revision: 0,
            hub: Arc::new(SubscriptionHub::default()),
        }
    }
}

impl<E: EntityKind> CollectionState<E> {
    #[must_use]
    pub const fn rows(&self) -> &DataStore<E> {
        &self.rows
    }

    /// Bumped once per committed non-empty batch.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

///
/// Collections
///

#[derive(Debug, Default)]
pub struct Collections {
    pub(crate) operators: CollectionState<Operator>,
    pub(crate) terminals: CollectionState<Terminal>,
    pub(crate) facilities: CollectionState<Facility>,
    pub(crate) advertisements: CollectionState<Advertisement>,
    pub(crate) settings: SettingsState,
}

///
/// CollectionCounts
///
/// Record count per entity collection, for dashboard summaries.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CollectionCounts {
    pub operators: usize,
    pub terminals: usize,
    pub facilities: usize,
    pub advertisements: usize,
}

///
/// CatalogStore
///
/// Cheap to clone; clones share the same collections.
///

#[derive(Clone, Debug, Default)]
pub struct CatalogStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    config: CatalogConfig,
    collections: RwLock<Collections>,
}

impl CatalogStore {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                collections: RwLock::new(Collections::default()),
            }),
        })
    }

    #[must_use]
    pub fn catalog_config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    // A panic while holding the lock cannot leave a half-applied batch:
    // `apply` is infallible and runs after all fallible work.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn collection<E: EntityKind>(&self) -> Collection<E> {
        Collection::new(self.clone())
    }

    #[must_use]
    pub fn operators(&self) -> Collection<Operator> {
        self.collection()
    }

    #[must_use]
    pub fn terminals(&self) -> Collection<Terminal> {
        self.collection()
    }

    #[must_use]
    pub fn facilities(&self) -> Collection<Facility> {
        self.collection()
    }

    #[must_use]
    pub fn advertisements(&self) -> Collection<Advertisement> {
        self.collection()
    }

    #[must_use]
    pub fn counts(&self) -> CollectionCounts {
        let guard = self.read();

        CollectionCounts {
            operators: guard.operators.rows.len(),
            terminals: guard.terminals.rows.len(),
            facilities: guard.facilities.rows.len(),
            advertisements: guard.advertisements.rows.len(),
        }
    }

    /// Terminals whose copied operator fields predate the operator's
    /// current version.
    pub fn stale_terminals(
        &self,
        operator_id: EntityId,
    ) -> Result<Vec<Record<Terminal>>, CatalogError> {
        self.terminals().stale(operator_id)
    }

    /// Re-copy the operator into every stale terminal. Returns how many
    /// terminals were rewritten.
    pub fn reconcile_terminals(
        &self,
        operator_id: EntityId,
    ) -> Result<usize, CatalogError> {
        self.terminals().reconcile(operator_id)
    }

    /// Reader for terminal display under `policy`. A live-join reader
    /// captures the operators committed at this moment.
    #[must_use]
    pub fn terminal_reader(&self, policy: ReadPolicy) -> TerminalReader {
        match policy {
            ReadPolicy::Snapshot => TerminalReader::snapshot(),
            ReadPolicy::LiveJoin => {
                let guard = self.read();
                let operators = guard
                    .operators
                    .rows
                    .iter()
                    .map(|(id, row)| Record::new(*id, row.entity().clone()));

                TerminalReader::live(operators)
            }
        }
    }
}
