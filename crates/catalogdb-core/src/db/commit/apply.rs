use crate::{
    db::{
        Collections,
        commit::{BatchReceipt, PreparedAction, PreparedBatch},
    },
    obs::sink::{MetricsEvent, record},
    traits::EntityKind,
};
use tracing::{debug, warn};

/// Write a prepared batch, bump the collection revision and publish once.
pub(crate) fn apply_batch<E: EntityKind>(
    collections: &mut Collections,
    batch: PreparedBatch<E>,
) -> BatchReceipt {
    let mut receipt = BatchReceipt::default();

    // Phase 1: mutate rows and notify subscribers.
    let state = E::collection_mut(collections);
    for op in batch.ops {
        match op.action {
            PreparedAction::Insert(row) => {
                state.rows.insert(op.id, row);
                receipt.inserted.push(op.id);
            }
            PreparedAction::Update(row) => {
                state.rows.insert(op.id, row);
                receipt.updated.push(op.id);
            }
            PreparedAction::Delete => {
                state.rows.remove(&op.id);
                receipt.deleted.push(op.id);
            }
        }
    }

    if !receipt.is_empty() {
        state.revision += 1;
        state.hub.publish(&state.rows, state.revision);
    }
    receipt.revision = state.revision;

    // Phase 2: report references left dangling by deletes.
    let dangling: usize = receipt
        .deleted
        .iter()
        .map(|id| E::count_dependents(collections, *id))
        .sum();
    if dangling > 0 {
        warn!(
            collection = E::MODEL.path,
            dangling, "delete left records referencing a removed parent"
        );
        record(MetricsEvent::DanglingReferences {
            entity_path: E::MODEL.path,
            dangling: dangling as u64,
        });
    }

    record(MetricsEvent::BatchCommitted {
        entity_path: E::MODEL.path,
        inserts: receipt.inserted.len() as u64,
        updates: receipt.updated.len() as u64,
        deletes: receipt.deleted.len() as u64,
    });
    debug!(
        collection = E::MODEL.path,
        inserted = receipt.inserted.len(),
        updated = receipt.updated.len(),
        deleted = receipt.deleted.len(),
        revision = receipt.revision,
        "batch committed"
    );

    receipt
}
