use crate::{
    db::{CollectionState, Collections},
    entity::require_text,
    error::ValidationError,
    index::KeywordSet,
    model::EntityModel,
    traits::{EntityKind, Verifiable},
    types::EntityId,
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// Operator
///
/// Transport company. Referenced by terminals, which copy its name and
/// verified flag at write time.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub name: String,
    pub name_lower: String,
    pub verified: bool,
    pub keywords: KeywordSet,
}

///
/// OperatorDraft
///

#[derive(Clone, Debug, Default)]
pub struct OperatorDraft {
    pub name: String,
    pub verified: bool,
}

impl OperatorDraft {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verified: false,
        }
    }

    #[must_use]
    pub const fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }
}

///
/// OperatorPatch
///

#[derive(Clone, Debug, Default)]
pub struct OperatorPatch {
    pub name: Option<String>,
    pub verified: Option<bool>,
}

impl EntityKind for Operator {
    type Draft = OperatorDraft;
    type Patch = OperatorPatch;

    const MODEL: &'static EntityModel = &EntityModel {
        path: "bus_operators",
        fields: &["name", "nameLower", "verified", "keywords"],
        ordered: &["nameLower", "name"],
        filters: &["verified"],
        lowercase: &["nameLower"],
        search_field: "nameLower",
    };

    fn from_draft(draft: OperatorDraft) -> Self {
        Self {
            name: draft.name.trim().to_string(),
            name_lower: String::new(),
            verified: draft.verified,
            keywords: KeywordSet::new(),
        }
    }

    fn apply_patch(&mut self, patch: OperatorPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(verified) = patch.verified {
            self.verified = verified;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::MODEL.path, "name", &self.name)
    }

    fn keyword_sources(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name)]
    }

    fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    fn set_keywords(&mut self, keywords: KeywordSet) {
        self.keywords = keywords;
    }

    fn refresh_lowercase(&mut self) {
        self.name_lower = self.name.to_lowercase();
    }

    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::text(&self.name)),
            "nameLower" => Some(Value::text(&self.name_lower)),
            "verified" => Some(Value::Bool(self.verified)),
            "keywords" => Some(Value::TextList(self.keywords.iter().cloned().collect())),
            _ => None,
        }
    }

    fn count_dependents(collections: &Collections, id: EntityId) -> usize {
        collections
            .terminals
            .rows
            .iter()
            .filter(|(_, row)| row.entity().operator_id == id)
            .count()
    }

    fn collection(collections: &Collections) -> &CollectionState<Self> {
        &collections.operators
    }

    fn collection_mut(collections: &mut Collections) -> &mut CollectionState<Self> {
        &mut collections.operators
    }
}

impl Verifiable for Operator {
    fn verified(&self) -> bool {
        self.verified
    }

    fn verified_patch(verified: bool) -> OperatorPatch {
        OperatorPatch {
            verified: Some(verified),
            ..OperatorPatch::default()
        }
    }
}
