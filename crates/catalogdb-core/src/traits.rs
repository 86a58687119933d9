//! Module: traits
//! Responsibility: the entity contract every catalog collection implements.
//! Does not own: storage; `db` drives these hooks on every write.

use crate::{
    db::{CollectionState, Collections, ParentStamp},
    error::{ReferenceError, ValidationError},
    index::{KeywordSet, index},
    model::EntityModel,
    types::EntityId,
    value::Value,
};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

///
/// EntityKind
///
/// One catalog record type. Writes flow draft/patch -> `resolve_references`
/// -> `refresh_derived` -> `validate`, so derived fields are always
/// recomputed from the record's current text before it is persisted.
///

pub trait EntityKind:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Draft: Debug + Send;
    type Patch: Clone + Debug + Default + Send;

    const MODEL: &'static EntityModel;

    /// Build an unrefreshed record from caller input.
    fn from_draft(draft: Self::Draft) -> Self;

    /// Merge the fields present in `patch` into this record.
    fn apply_patch(&mut self, patch: Self::Patch);

    fn validate(&self) -> Result<(), ValidationError>;

    /// Designated free-text fields feeding the keyword index, in order.
    fn keyword_sources(&self) -> Vec<Option<&str>>;

    fn keywords(&self) -> &KeywordSet;

    fn set_keywords(&mut self, keywords: KeywordSet);

    /// Recompute non-keyword derived fields such as lowercase sort copies.
    fn refresh_lowercase(&mut self) {}

    /// Dynamic field access for ordering and predicates. `None` means absent.
    fn value(&self, field: &str) -> Option<Value>;

    /// Copy denormalized parent fields. Returns the stamp of the parent
    /// snapshot that was copied, if this entity has a parent.
    fn resolve_references(
        &mut self,
        _collections: &Collections,
    ) -> Result<Option<ParentStamp>, ReferenceError> {
        Ok(None)
    }

    /// Records in other collections that reference `id` and would be left
    /// dangling if it were deleted.
    fn count_dependents(_collections: &Collections, _id: EntityId) -> usize {
        0
    }

    fn collection(collections: &Collections) -> &CollectionState<Self>;

    fn collection_mut(collections: &mut Collections) -> &mut CollectionState<Self>;

    /// Recompute every derived field from the current field values.
    fn refresh_derived(&mut self) {
        self.refresh_lowercase();
        let keywords = index(self.keyword_sources());
        self.set_keywords(keywords);
    }
}

///
/// Denormalized
///
/// A child entity holding a value snapshot of selected parent fields.
///

pub trait Denormalized: EntityKind {
    type Parent: EntityKind;

    /// Wire name of the field holding the parent id.
    const PARENT_FIELD: &'static str;

    fn parent_id(&self) -> EntityId;

    /// Overwrite the denormalized copy with the parent's current values.
    fn copy_from_parent(&mut self, parent: &Self::Parent);
}

///
/// Verifiable
///
/// Entities carrying a `verified` flag that operators toggle from lists.
///

pub trait Verifiable: EntityKind {
    fn verified(&self) -> bool;

    fn verified_patch(verified: bool) -> Self::Patch;
}
