use crate::{
    db::{
        BatchOp, BatchReceipt, CatalogStore, Collections, Record, Row, Subscription,
        commit::{PreparedBatch, apply_batch, prepare_batch, prepare_op},
    },
    entity::Advertisement,
    error::{BatchError, CatalogError, IndexMissingError},
    index::normalize_token,
    obs::sink::{MetricsEvent, record},
    query::{Page, Predicate, plan::QueryPlan, prefix_query, read_page},
    traits::{Denormalized, EntityKind, Verifiable},
    types::EntityId,
};
use std::marker::PhantomData;
use tracing::{debug, warn};

///
/// Collection
///
/// Typed handle on one collection of a `CatalogStore`. Handles are cheap to
/// clone and share the store they were created from.
///

#[derive(Debug)]
pub struct Collection<E: EntityKind> {
    store: CatalogStore,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntityKind> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<E: EntityKind> Collection<E> {
    pub(crate) const fn new(store: CatalogStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &CatalogStore {
        &self.store
    }

    // reads

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Record<E>> {
        E::collection(&self.store.read()).rows.record(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        E::collection(&self.store.read()).rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        E::collection(&self.store.read()).revision
    }

    /// Every record, ascending by `order`.
    pub fn list_all(&self, order: &str) -> Result<Vec<Record<E>>, CatalogError> {
        self.query(order, None)
    }

    /// Every record matching `predicate`, ascending by `order`.
    pub fn query(
        &self,
        order: &str,
        predicate: Option<Predicate>,
    ) -> Result<Vec<Record<E>>, CatalogError> {
        let plan = self.plan(order, predicate)?;

        Ok(plan.execute(&E::collection(&self.store.read()).rows))
    }

    /// Case-insensitive prefix match on a lowercase ordered field. A blank
    /// term returns the whole collection in order.
    ///
    /// Fields not declared lowercase in the model are rejected: the term is
    /// lowercased, so a mixed-case field would silently miss.
    pub fn prefix_search(&self, field: &str, term: &str) -> Result<Vec<Record<E>>, CatalogError> {
        let plan = self.plan(field, prefix_query(field, term))?;
        if !E::MODEL.is_lowercase(field) {
            let err = IndexMissingError::CaseSensitive {
                collection: E::MODEL.path,
                field: field.to_string(),
            };
            warn!(collection = E::MODEL.path, error = %err, "query rejected");
            record(MetricsEvent::IndexMissing {
                entity_path: E::MODEL.path,
            });

            return Err(err.into());
        }

        Ok(plan.execute(&E::collection(&self.store.read()).rows))
    }

    /// Exact keyword-token membership, ordered by the collection's primary
    /// search field. A blank term returns every record.
    pub fn token_search(&self, term: &str) -> Result<Vec<Record<E>>, CatalogError> {
        let predicate = normalize_token(term).map(Predicate::HasKeyword);

        self.query(E::MODEL.search_field, predicate)
    }

    /// One page with the configured default page size. `cursor` must come
    /// from a page of the same ordering and predicate.
    pub fn page(
        &self,
        order: &str,
        predicate: Option<Predicate>,
        cursor: Option<&str>,
    ) -> Result<Page<E>, CatalogError> {
        let page_size = self.store.catalog_config().page_size;

        self.page_with(order, predicate, cursor, page_size)
    }

    pub fn first_page(
        &self,
        order: &str,
        predicate: Option<Predicate>,
        page_size: usize,
    ) -> Result<Page<E>, CatalogError> {
        self.page_with(order, predicate, None, page_size)
    }

    /// Records strictly after `cursor` under the same ordering and filter.
    pub fn next_page(
        &self,
        order: &str,
        predicate: Option<Predicate>,
        cursor: &str,
        page_size: usize,
    ) -> Result<Page<E>, CatalogError> {
        self.page_with(order, predicate, Some(cursor), page_size)
    }

    fn page_with(
        &self,
        order: &str,
        predicate: Option<Predicate>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<E>, CatalogError> {
        let plan = self.plan(order, predicate)?;

        read_page(&plan, &E::collection(&self.store.read()).rows, cursor, page_size)
    }

    fn plan(&self, order: &str, predicate: Option<Predicate>) -> Result<QueryPlan, CatalogError> {
        QueryPlan::new::<E>(order, predicate).map_err(|err| {
            warn!(collection = E::MODEL.path, error = %err, "query rejected");
            CatalogError::from(err)
        })
    }

    // subscriptions

    /// Live full-snapshot view of the whole collection ordered by `order`.
    #[must_use]
    pub fn subscribe_all(&self, order: &str) -> Subscription<E> {
        self.subscribe(order, None)
    }

    /// Live full-snapshot view of a filtered query. Consumers of the same
    /// (ordering, predicate) share one underlying entry.
    ///
    /// An unsupported query is never registered: the returned handle
    /// yields its error once and then ends.
    #[must_use]
    pub fn subscribe(&self, order: &str, predicate: Option<Predicate>) -> Subscription<E> {
        let plan = match QueryPlan::new::<E>(order, predicate) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(collection = E::MODEL.path, error = %err, "subscription failed");
                return Subscription::failed(err.into());
            }
        };

        let guard = self.store.read();
        let state = E::collection(&guard);

        state.hub.subscribe(plan, &state.rows, state.revision)
    }

    /// Distinct live queries on this collection.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        E::collection(&self.store.read()).hub.active_queries()
    }

    // writes

    /// Insert one record and return its new id.
    pub fn insert(&self, draft: E::Draft) -> Result<EntityId, CatalogError> {
        self.mutate(BatchOp::Insert(draft))
    }

    pub fn update(&self, id: EntityId, patch: E::Patch) -> Result<(), CatalogError> {
        self.mutate(BatchOp::Update(id, patch)).map(|_| ())
    }

    pub fn delete(&self, id: EntityId) -> Result<(), CatalogError> {
        self.mutate(BatchOp::Delete(id)).map(|_| ())
    }

    /// Commit one op atomically. Errors are reported as-is rather than
    /// wrapped in a `BatchError`. Returns the id the op touched.
    pub fn mutate(&self, op: BatchOp<E>) -> Result<EntityId, CatalogError> {
        let mut guard = self.store.write();

        Self::commit_one(&mut guard, op)
    }

    fn commit_one(collections: &mut Collections, op: BatchOp<E>) -> Result<EntityId, CatalogError> {
        let prepared = prepare_op(collections, op).inspect_err(|err| {
            warn!(collection = E::MODEL.path, error = %err, "write rejected");
            record(MetricsEvent::BatchRejected {
                entity_path: E::MODEL.path,
            });
        })?;
        let id = prepared.id;
        apply_batch(
            collections,
            PreparedBatch {
                ops: vec![prepared],
            },
        );

        Ok(id)
    }

    /// Commit `ops` atomically: every op is applied, or none is.
    pub fn commit_batch(&self, ops: Vec<BatchOp<E>>) -> Result<BatchReceipt, CatalogError> {
        let max = self.store.catalog_config().max_batch_size;
        if ops.len() > max {
            let err = BatchError::TooLarge {
                len: ops.len(),
                max,
            };
            warn!(collection = E::MODEL.path, error = %err, "batch rejected");
            record(MetricsEvent::BatchRejected {
                entity_path: E::MODEL.path,
            });
            return Err(err.into());
        }

        let mut guard = self.store.write();
        let prepared = prepare_batch(&guard, ops).inspect_err(|err| {
            warn!(collection = E::MODEL.path, error = %err, "batch rejected");
            record(MetricsEvent::BatchRejected {
                entity_path: E::MODEL.path,
            });
        })?;

        Ok(apply_batch(&mut guard, prepared))
    }

    /// Split `ops` into sequential batches of at most the configured size.
    ///
    /// Each chunk is atomic on its own. The first failing chunk stops the
    /// sequence; chunks before it stay committed.
    pub fn commit_chunked(&self, ops: Vec<BatchOp<E>>) -> Result<Vec<BatchReceipt>, CatalogError> {
        let max = self.store.catalog_config().max_batch_size;
        let mut receipts = Vec::new();
        let mut ops = ops.into_iter();

        loop {
            let chunk: Vec<_> = ops.by_ref().take(max).collect();
            if chunk.is_empty() {
                break;
            }

            match self.commit_batch(chunk) {
                Ok(receipt) => receipts.push(receipt),
                Err(source) => {
                    return Err(BatchError::ChunkFailed {
                        chunk: receipts.len(),
                        source: Box::new(source),
                    }
                    .into());
                }
            }
        }

        debug!(
            collection = E::MODEL.path,
            chunks = receipts.len(),
            "chunked commit finished"
        );

        Ok(receipts)
    }

    /// Flip a boolean field read by `current`, as one atomic read-patch-write.
    fn toggle(
        &self,
        id: EntityId,
        current: impl FnOnce(&E) -> bool,
        patch: impl FnOnce(bool) -> E::Patch,
    ) -> Result<bool, CatalogError> {
        let mut guard = self.store.write();
        let value = E::collection(&guard)
            .rows
            .get(&id)
            .map(|row| current(row.entity()))
            .ok_or_else(|| CatalogError::not_found(E::MODEL.path, id))?;

        Self::commit_one(&mut guard, BatchOp::Update(id, patch(!value)))?;

        Ok(!value)
    }
}

impl<E: Verifiable> Collection<E> {
    /// Flip `verified`. Returns the new value.
    pub fn toggle_verified(&self, id: EntityId) -> Result<bool, CatalogError> {
        self.toggle(id, <E as Verifiable>::verified, E::verified_patch)
    }
}

impl Collection<Advertisement> {
    /// Flip `enabled`. Returns the new value.
    pub fn toggle_enabled(&self, id: EntityId) -> Result<bool, CatalogError> {
        self.toggle(id, |ad| ad.enabled, Advertisement::enabled_patch)
    }
}

impl<C: Denormalized> Collection<C> {
    /// Children of `parent_id` whose copied fields were taken from an older
    /// parent version.
    pub fn stale(&self, parent_id: EntityId) -> Result<Vec<Record<C>>, CatalogError> {
        let guard = self.store.read();
        let parent_version = <C::Parent as EntityKind>::collection(&guard)
            .rows
            .get(&parent_id)
            .map(Row::version)
            .ok_or_else(|| {
                CatalogError::not_found(<C::Parent as EntityKind>::MODEL.path, parent_id)
            })?;

        Ok(C::collection(&guard)
            .rows
            .iter()
            .filter(|(_, row)| {
                row.parent_stamp().is_some_and(|stamp| {
                    stamp.parent_id == parent_id && stamp.parent_version < parent_version
                })
            })
            .map(|(id, row)| Record::new(*id, row.entity().clone()))
            .collect())
    }

    /// Rewrite every stale child of `parent_id`, which re-copies the parent.
    /// Returns the number of children rewritten.
    pub fn reconcile(&self, parent_id: EntityId) -> Result<usize, CatalogError> {
        let ops: Vec<_> = self
            .stale(parent_id)?
            .into_iter()
            .map(|record| BatchOp::Update(record.id, C::Patch::default()))
            .collect();
        let count = ops.len();
        if count == 0 {
            return Ok(0);
        }

        self.commit_chunked(ops)?;
        debug!(
            collection = C::MODEL.path,
            parent = %parent_id,
            count,
            "stale children reconciled"
        );

        Ok(count)
    }
}
