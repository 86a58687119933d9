use crate::{
    db::{DataStore, Record},
    error::IndexMissingError,
    model::EntityModel,
    obs::sink::{MetricsEvent, record},
    query::Predicate,
    traits::EntityKind,
    types::EntityId,
    value::Value,
};
use sha2::{Digest, Sha256};

///
/// SortKey
///
/// Position of one record under an ordering: the ordered field's value with
/// the record id as tie-breaker.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct SortKey {
    pub(crate) value: Value,
    pub(crate) id: EntityId,
}

///
/// QueryPlan
///
/// A validated (collection, ordering, predicate) triple. Also the identity
/// of a shared subscription and the input of a cursor signature.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct QueryPlan {
    pub(crate) collection: &'static str,
    pub(crate) order: &'static str,
    pub(crate) predicate: Option<Predicate>,
}

impl QueryPlan {
    /// Validate `order` and `predicate` against the collection's declared
    /// indexes.
    pub(crate) fn new<E: EntityKind>(
        order: &str,
        predicate: Option<Predicate>,
    ) -> Result<Self, IndexMissingError> {
        let model = E::MODEL;
        let result = Self::resolve(model, order, predicate);

        if result.is_err() {
            record(MetricsEvent::IndexMissing {
                entity_path: model.path,
            });
        }

        result
    }

    fn resolve(
        model: &'static EntityModel,
        order: &str,
        predicate: Option<Predicate>,
    ) -> Result<Self, IndexMissingError> {
        let Some(order) = model.ordered.iter().copied().find(|field| *field == order) else {
            return Err(IndexMissingError::Order {
                collection: model.path,
                field: order.to_string(),
            });
        };
        if let Some(predicate) = &predicate {
            predicate.check(model, order)?;
        }

        Ok(Self {
            collection: model.path,
            order,
            predicate,
        })
    }

    /// Stable digest of the plan, bound into every cursor it issues.
    pub(crate) fn signature(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"catalogdb.cursor.v1\0");
        hash_str(&mut hasher, self.collection);
        hash_str(&mut hasher, self.order);
        match &self.predicate {
            Some(predicate) => {
                hasher.update([1]);
                hash_predicate(&mut hasher, predicate);
            }
            None => hasher.update([0]),
        }

        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    pub(crate) fn sort_key<E: EntityKind>(&self, id: EntityId, entity: &E) -> Option<SortKey> {
        entity
            .value(self.order)
            .map(|value| SortKey { value, id })
    }

    /// Every matching record in order. Records without the ordered field
    /// are not part of the ordering and are skipped.
    pub(crate) fn execute<E: EntityKind>(&self, rows: &DataStore<E>) -> Vec<Record<E>> {
        self.execute_window(rows, None, usize::MAX)
    }

    /// At most `limit` matching records strictly after `after`.
    pub(crate) fn execute_window<E: EntityKind>(
        &self,
        rows: &DataStore<E>,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Vec<Record<E>> {
        // Phase 1: filter and key every row.
        let mut matched: Vec<(SortKey, &E)> = rows
            .iter()
            .filter(|(_, row)| {
                self.predicate
                    .as_ref()
                    .is_none_or(|predicate| predicate.matches(row.entity()))
            })
            .filter_map(|(id, row)| {
                self.sort_key(*id, row.entity())
                    .map(|key| (key, row.entity()))
            })
            .filter(|(key, _)| after.is_none_or(|after| key > after))
            .collect();

        record(MetricsEvent::RowsScanned {
            entity_path: self.collection,
            rows_scanned: rows.len() as u64,
        });

        // Phase 2: order and window.
        matched.sort_by(|(a, _), (b, _)| a.cmp(b));
        matched
            .into_iter()
            .take(limit)
            .map(|(key, entity)| Record::new(key.id, entity.clone()))
            .collect()
    }
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Bool(flag) => hasher.update([0x10, u8::from(*flag)]),
        Value::Text(text) => {
            hasher.update([0x11]);
            hash_str(hasher, text);
        }
        Value::TextList(items) => {
            hasher.update([0x12]);
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                hash_str(hasher, item);
            }
        }
    }
}

fn hash_predicate(hasher: &mut Sha256, predicate: &Predicate) {
    match predicate {
        Predicate::Range {
            field,
            lower,
            upper,
        } => {
            hasher.update([0x01]);
            hash_str(hasher, field);
            hash_value(hasher, lower);
            hash_value(hasher, upper);
        }
        Predicate::Eq { field, value } => {
            hasher.update([0x02]);
            hash_str(hasher, field);
            hash_value(hasher, value);
        }
        Predicate::HasKeyword(token) => {
            hasher.update([0x03]);
            hash_str(hasher, token);
        }
        Predicate::And(parts) => {
            hasher.update([0x04]);
            hasher.update((parts.len() as u64).to_be_bytes());
            for part in parts {
                hash_predicate(hasher, part);
            }
        }
    }
}
