//! Parent snapshots copied into child records, and the two read policies
//! for displaying them.
//!
//! Parent edits never cascade. A child keeps the values it copied at its
//! last write until it is written again, either by a caller or by an
//! explicit reconciliation pass.

use crate::{
    UNKNOWN_OPERATOR,
    db::{CollectionState, Record},
    entity::{Operator, Terminal},
    error::ReferenceError,
    traits::{Denormalized, EntityKind},
    types::EntityId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// ParentStamp
///
/// Which parent row, at which version, a child's copied fields came from.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentStamp {
    pub parent_id: EntityId,
    pub parent_version: u64,
}

/// Copy the designated parent fields into `child`.
///
/// Fails with `ReferenceError` when the parent does not exist; `child` is
/// left untouched in that case.
pub(crate) fn materialize<C: Denormalized>(
    child: &mut C,
    parents: &CollectionState<C::Parent>,
) -> Result<ParentStamp, ReferenceError> {
    let parent_id = child.parent_id();
    let Some(row) = parents.rows.get(&parent_id) else {
        return Err(ReferenceError {
            child: C::MODEL.path,
            field: C::PARENT_FIELD,
            parent: <C::Parent as EntityKind>::MODEL.path,
            parent_id,
        });
    };

    child.copy_from_parent(row.entity());

    Ok(ParentStamp {
        parent_id,
        parent_version: row.version(),
    })
}

///
/// ReadPolicy
///
/// How a consumer displays a terminal's operator. A reader holds exactly one
/// policy, so one view never mixes stored and joined values.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadPolicy {
    /// Trust the copy stored on the terminal. Cheap; may be stale.
    Snapshot,

    /// Resolve `operatorId` against the current operators. Missing operators
    /// display as `UNKNOWN_OPERATOR`.
    LiveJoin,
}

///
/// TerminalView
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalView {
    pub id: EntityId,
    pub operator_name: String,
    pub operator_verified: bool,
    pub terminal: Terminal,
}

///
/// TerminalReader
///

#[derive(Clone, Debug)]
pub struct TerminalReader {
    policy: ReadPolicy,
    operators: BTreeMap<EntityId, Operator>,
}

impl TerminalReader {
    /// Reader trusting stored snapshots.
    #[must_use]
    pub const fn snapshot() -> Self {
        Self {
            policy: ReadPolicy::Snapshot,
            operators: BTreeMap::new(),
        }
    }

    /// Reader joining against the given operator set.
    #[must_use]
    pub fn live<I>(operators: I) -> Self
    where
        I: IntoIterator<Item = Record<Operator>>,
    {
        Self {
            policy: ReadPolicy::LiveJoin,
            operators: operators
                .into_iter()
                .map(|record| (record.id, record.entity))
                .collect(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> ReadPolicy {
        self.policy
    }

    #[must_use]
    pub fn operator_name<'a>(&'a self, terminal: &'a Terminal) -> &'a str {
        match self.policy {
            ReadPolicy::Snapshot => &terminal.operator_name,
            ReadPolicy::LiveJoin => self
                .operators
                .get(&terminal.operator_id)
                .map_or(UNKNOWN_OPERATOR, |operator| operator.name.as_str()),
        }
    }

    #[must_use]
    pub fn operator_verified(&self, terminal: &Terminal) -> bool {
        match self.policy {
            ReadPolicy::Snapshot => terminal.operator_verified,
            ReadPolicy::LiveJoin => self
                .operators
                .get(&terminal.operator_id)
                .is_some_and(|operator| operator.verified),
        }
    }

    #[must_use]
    pub fn read(&self, record: &Record<Terminal>) -> TerminalView {
        TerminalView {
            id: record.id,
            operator_name: self.operator_name(&record.entity).to_string(),
            operator_verified: self.operator_verified(&record.entity),
            terminal: record.entity.clone(),
        }
    }

    #[must_use]
    pub fn read_all(&self, records: &[Record<Terminal>]) -> Vec<TerminalView> {
        records.iter().map(|record| self.read(record)).collect()
    }
}
