use crate::{
    db::{
        Collections, Row,
        commit::{BatchOp, PreparedAction, PreparedBatch, PreparedOp},
    },
    error::{BatchError, CatalogError},
    traits::EntityKind,
    types::EntityId,
};
use std::collections::BTreeMap;

/// Staged view of rows already touched earlier in the same batch.
type Overlay<E> = BTreeMap<EntityId, Option<Row<E>>>;

/// Resolve and validate every op of a batch without writing anything.
///
/// Ops are prepared in order against a staged overlay, so a later op sees
/// the effect of an earlier one on the same id. The first failure aborts the
/// whole batch.
pub(crate) fn prepare_batch<E: EntityKind>(
    collections: &Collections,
    ops: Vec<BatchOp<E>>,
) -> Result<PreparedBatch<E>, BatchError> {
    let mut overlay = Overlay::new();
    let mut prepared = Vec::with_capacity(ops.len());

    for (index, op) in ops.into_iter().enumerate() {
        let op = prepare_with_overlay(collections, &overlay, op).map_err(|source| {
            BatchError::OpFailed {
                index,
                source: Box::new(source),
            }
        })?;

        overlay.insert(op.id, op.staged_row());
        prepared.push(op);
    }

    Ok(PreparedBatch { ops: prepared })
}

/// Prepare a single op against committed state only.
pub(crate) fn prepare_op<E: EntityKind>(
    collections: &Collections,
    op: BatchOp<E>,
) -> Result<PreparedOp<E>, CatalogError> {
    prepare_with_overlay(collections, &Overlay::new(), op)
}

fn prepare_with_overlay<E: EntityKind>(
    collections: &Collections,
    overlay: &Overlay<E>,
    op: BatchOp<E>,
) -> Result<PreparedOp<E>, CatalogError> {
    match op {
        BatchOp::Insert(draft) => {
            let row = finish_row(collections, E::from_draft(draft), 1)?;

            Ok(PreparedOp {
                id: EntityId::generate(),
                action: PreparedAction::Insert(row),
            })
        }

        BatchOp::Update(id, patch) => {
            let Some(existing) = current(collections, overlay, &id) else {
                return Err(CatalogError::not_found(E::MODEL.path, id));
            };
            let mut entity = existing.entity().clone();
            entity.apply_patch(patch);
            let row = finish_row(collections, entity, existing.version() + 1)?;

            Ok(PreparedOp {
                id,
                action: PreparedAction::Update(row),
            })
        }

        BatchOp::Delete(id) => {
            if current(collections, overlay, &id).is_none() {
                return Err(CatalogError::not_found(E::MODEL.path, id));
            }

            Ok(PreparedOp {
                id,
                action: PreparedAction::Delete,
            })
        }
    }
}

/// Row as seen by the op being prepared: staged if touched earlier in the
/// batch, committed otherwise.
fn current<'a, E: EntityKind>(
    collections: &'a Collections,
    overlay: &'a Overlay<E>,
    id: &EntityId,
) -> Option<&'a Row<E>> {
    match overlay.get(id) {
        Some(staged) => staged.as_ref(),
        None => E::collection(collections).rows.get(id),
    }
}

// Phase order matters: derived keywords read the parent fields copied by
// `resolve_references`.
fn finish_row<E: EntityKind>(
    collections: &Collections,
    mut entity: E,
    version: u64,
) -> Result<Row<E>, CatalogError> {
    let stamp = entity.resolve_references(collections)?;
    entity.refresh_derived();
    entity.validate()?;

    Ok(Row::new(entity, version, stamp))
}
