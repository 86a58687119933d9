use crate::{
    db::{CollectionState, Collections, ParentStamp, materialize},
    entity::{Operator, normalize_list, normalize_optional, require_text},
    error::{ReferenceError, ValidationError},
    index::KeywordSet,
    model::EntityModel,
    traits::{Denormalized, EntityKind},
    types::EntityId,
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// Terminal
///
/// Station location of one operator. The `operator*` fields are a
/// copy-on-write snapshot of the operator taken at the last write, not a
/// live join.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Terminal {
    pub operator_id: EntityId,
    pub operator_name: String,
    pub operator_name_lower: String,
    pub operator_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_name: Option<String>,
    pub city: String,
    pub address: String,
    pub phones: Vec<String>,
    pub keywords: KeywordSet,
}

///
/// TerminalDraft
///

#[derive(Clone, Debug)]
pub struct TerminalDraft {
    pub operator_id: EntityId,
    pub terminal_name: Option<String>,
    pub city: String,
    pub address: String,
    pub phones: Vec<String>,
}

impl TerminalDraft {
    #[must_use]
    pub fn new(operator_id: EntityId, city: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            operator_id,
            terminal_name: None,
            city: city.into(),
            address: address.into(),
            phones: Vec::new(),
        }
    }

    #[must_use]
    pub fn terminal_name(mut self, name: impl Into<String>) -> Self {
        self.terminal_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn phones<I, S>(mut self, phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phones = phones.into_iter().map(Into::into).collect();
        self
    }
}

///
/// TerminalPatch
///
/// `terminal_name: Some(None)` clears the name.
///

#[derive(Clone, Debug, Default)]
pub struct TerminalPatch {
    pub operator_id: Option<EntityId>,
    pub terminal_name: Option<Option<String>>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phones: Option<Vec<String>>,
}

impl EntityKind for Terminal {
    type Draft = TerminalDraft;
    type Patch = TerminalPatch;

    const MODEL: &'static EntityModel = &EntityModel {
        path: "bus_terminals",
        fields: &[
            "operatorId",
            "operatorName",
            "operatorNameLower",
            "operatorVerified",
            "terminalName",
            "city",
            "address",
            "phones",
            "keywords",
        ],
        ordered: &["city", "operatorNameLower"],
        filters: &["operatorId", "operatorVerified"],
        lowercase: &["operatorNameLower"],
        search_field: "operatorNameLower",
    };

    fn from_draft(draft: TerminalDraft) -> Self {
        Self {
            operator_id: draft.operator_id,
            operator_name: String::new(),
            operator_name_lower: String::new(),
            operator_verified: false,
            terminal_name: normalize_optional(draft.terminal_name),
            city: draft.city.trim().to_string(),
            address: draft.address.trim().to_string(),
            phones: normalize_list(draft.phones),
            keywords: KeywordSet::new(),
        }
    }

    fn apply_patch(&mut self, patch: TerminalPatch) {
        if let Some(operator_id) = patch.operator_id {
            self.operator_id = operator_id;
        }
        if let Some(terminal_name) = patch.terminal_name {
            self.terminal_name = normalize_optional(terminal_name);
        }
        if let Some(city) = patch.city {
            self.city = city.trim().to_string();
        }
        if let Some(address) = patch.address {
            self.address = address.trim().to_string();
        }
        if let Some(phones) = patch.phones {
            self.phones = normalize_list(phones);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::MODEL.path, "city", &self.city)?;
        require_text(Self::MODEL.path, "address", &self.address)?;

        Ok(())
    }

    fn keyword_sources(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.operator_name),
            self.terminal_name.as_deref(),
            Some(&self.city),
            Some(&self.address),
        ]
    }

    fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    fn set_keywords(&mut self, keywords: KeywordSet) {
        self.keywords = keywords;
    }

    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "operatorId" => Some(Value::from(self.operator_id)),
            "operatorName" => Some(Value::text(&self.operator_name)),
            "operatorNameLower" => Some(Value::text(&self.operator_name_lower)),
            "operatorVerified" => Some(Value::Bool(self.operator_verified)),
            "terminalName" => self.terminal_name.as_deref().map(Value::from),
            "city" => Some(Value::text(&self.city)),
            "address" => Some(Value::text(&self.address)),
            "phones" => Some(Value::TextList(self.phones.clone())),
            "keywords" => Some(Value::TextList(self.keywords.iter().cloned().collect())),
            _ => None,
        }
    }

    // Terminal writes always re-copy the operator, so an edit also refreshes
    // a stale snapshot.
    fn resolve_references(
        &mut self,
        collections: &Collections,
    ) -> Result<Option<ParentStamp>, ReferenceError> {
        let stamp = materialize(self, &collections.operators)?;

        Ok(Some(stamp))
    }

    fn collection(collections: &Collections) -> &CollectionState<Self> {
        &collections.terminals
    }

    fn collection_mut(collections: &mut Collections) -> &mut CollectionState<Self> {
        &mut collections.terminals
    }
}

impl Denormalized for Terminal {
    type Parent = Operator;

    const PARENT_FIELD: &'static str = "operatorId";

    fn parent_id(&self) -> EntityId {
        self.operator_id
    }

    fn copy_from_parent(&mut self, parent: &Operator) {
        self.operator_name.clone_from(&parent.name);
        self.operator_name_lower = parent.name.to_lowercase();
        self.operator_verified = parent.verified;
    }
}
