//! Module: db::commit
//! Responsibility: all-or-nothing batch writes for one collection.
//! Does not own: locking; callers hold the store write guard across both
//! phases.
//! Boundary: `prepare` is the only fallible phase. `apply` never fails, so a
//! batch is either fully visible or not visible at all.

mod apply;
mod prepare;

pub(crate) use apply::apply_batch;
pub(crate) use prepare::{prepare_batch, prepare_op};

use crate::{db::Row, traits::EntityKind, types::EntityId};
use serde::Serialize;

///
/// BatchOp
///

#[derive(Debug)]
pub enum BatchOp<E: EntityKind> {
    Insert(E::Draft),
    Update(EntityId, E::Patch),
    Delete(EntityId),
}

///
/// BatchReceipt
///
/// Ids touched by one committed batch, by kind, in op order.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BatchReceipt {
    pub inserted: Vec<EntityId>,
    pub updated: Vec<EntityId>,
    pub deleted: Vec<EntityId>,

    /// Collection revision after the commit.
    pub revision: u64,
}

impl BatchReceipt {
    #[must_use]
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// PreparedOp
///
/// One fully resolved, validated write awaiting apply.
///

#[derive(Clone, Debug)]
pub(crate) struct PreparedOp<E> {
    pub(crate) id: EntityId,
    pub(crate) action: PreparedAction<E>,
}

#[derive(Clone, Debug)]
pub(crate) enum PreparedAction<E> {
    Insert(Row<E>),
    Update(Row<E>),
    Delete,
}

impl<E: Clone> PreparedOp<E> {
    /// Row visible to later ops of the same batch; `None` once deleted.
    pub(crate) fn staged_row(&self) -> Option<Row<E>> {
        match &self.action {
            PreparedAction::Insert(row) | PreparedAction::Update(row) => Some(row.clone()),
            PreparedAction::Delete => None,
        }
    }
}

///
/// PreparedBatch
///

#[derive(Debug)]
pub(crate) struct PreparedBatch<E> {
    pub(crate) ops: Vec<PreparedOp<E>>,
}
