use crate::{
    db::{CollectionState, Collections},
    entity::{normalize_list, require_text},
    error::ValidationError,
    index::KeywordSet,
    model::EntityModel,
    traits::{EntityKind, Verifiable},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

///
/// FacilityType
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    PrivateHospital,
    PublicHospital,
    Clinic,
}

impl FacilityType {
    pub const ALL: [Self; 3] = [Self::PrivateHospital, Self::PublicHospital, Self::Clinic];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrivateHospital => "private_hospital",
            Self::PublicHospital => "public_hospital",
            Self::Clinic => "clinic",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                ValidationError::invalid(
                    Facility::MODEL.path,
                    "type",
                    format!(
                        "'{s}' is not one of private_hospital, public_hospital, clinic"
                    ),
                )
            })
    }
}

///
/// Facility
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub name: String,
    pub name_lower: String,
    #[serde(rename = "type")]
    pub kind: FacilityType,
    pub city: String,
    pub address: String,
    pub phones: Vec<String>,
    pub verified: bool,
    pub keywords: KeywordSet,
}

///
/// FacilityDraft
///

#[derive(Clone, Debug)]
pub struct FacilityDraft {
    pub name: String,
    pub kind: FacilityType,
    pub city: String,
    pub address: String,
    pub phones: Vec<String>,
    pub verified: bool,
}

impl FacilityDraft {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: FacilityType,
        city: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            city: city.into(),
            address: address.into(),
            phones: Vec::new(),
            verified: false,
        }
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

    #[must_use]
    pub const fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }
}

///
/// FacilityPatch
///

#[derive(Clone, Debug, Default)]
pub struct FacilityPatch {
    pub name: Option<String>,
    pub kind: Option<FacilityType>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phones: Option<Vec<String>>,
    pub verified: Option<bool>,
}

impl EntityKind for Facility {
    type Draft = FacilityDraft;
    type Patch = FacilityPatch;

    const MODEL: &'static EntityModel = &EntityModel {
        path: "medical_facilities",
        fields: &[
            "name",
            "nameLower",
            "type",
            "city",
            "address",
            "phones",
            "verified",
            "keywords",
        ],
        ordered: &["nameLower", "city"],
        filters: &["type", "verified"],
        lowercase: &["nameLower"],
        search_field: "nameLower",
    };

    fn from_draft(draft: FacilityDraft) -> Self {
        Self {
            name: draft.name.trim().to_string(),
            name_lower: String::new(),
            kind: draft.kind,
            city: draft.city.trim().to_string(),
            address: draft.address.trim().to_string(),
            phones: normalize_list(draft.phones),
            verified: draft.verified,
            keywords: KeywordSet::new(),
        }
    }

    fn apply_patch(&mut self, patch: FacilityPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
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
        if let Some(verified) = patch.verified {
            self.verified = verified;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let path = Self::MODEL.path;
        require_text(path, "name", &self.name)?;
        require_text(path, "city", &self.city)?;
        require_text(path, "address", &self.address)?;

        Ok(())
    }

    fn keyword_sources(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name), Some(&self.city), Some(self.kind.as_str())]
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
            "type" => Some(Value::from(self.kind.as_str())),
            "city" => Some(Value::text(&self.city)),
            "address" => Some(Value::text(&self.address)),
            "phones" => Some(Value::TextList(self.phones.clone())),
            "verified" => Some(Value::Bool(self.verified)),
            "keywords" => Some(Value::TextList(self.keywords.iter().cloned().collect())),
            _ => None,
        }
    }

    fn collection(collections: &Collections) -> &CollectionState<Self> {
        &collections.facilities
    }

    fn collection_mut(collections: &mut Collections) -> &mut CollectionState<Self> {
        &mut collections.facilities
    }
}

impl Verifiable for Facility {
    fn verified(&self) -> bool {
        self.verified
    }

    fn verified_patch(verified: bool) -> FacilityPatch {
        FacilityPatch {
            verified: Some(verified),
            ..FacilityPatch::default()
        }
    }
}
