use crate::{
    db::{CollectionState, Collections},
    entity::{normalize_list, normalize_optional, require_text},
    error::ValidationError,
    index::KeywordSet,
    model::EntityModel,
    traits::{EntityKind, Verifiable},
    value::Value,
};
use serde::{Deserialize, Serialize};

const fn enabled_by_default() -> bool {
    true
}

///
/// Advertisement
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub title: String,
    pub title_lower: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub contact: Vec<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub verified: bool,
    pub keywords: KeywordSet,
}

///
/// AdvertisementLinks
///
/// Optional outbound URLs; blank strings are treated as absent.
///

#[derive(Clone, Debug, Default)]
pub struct AdvertisementLinks {
    pub map: Option<String>,
    pub image: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub telegram: Option<String>,
    pub tiktok: Option<String>,
}

///
/// AdvertisementDraft
///

#[derive(Clone, Debug)]
pub struct AdvertisementDraft {
    pub title: String,
    pub description: Option<String>,
    pub contact: Vec<String>,
    pub address: String,
    pub links: AdvertisementLinks,
    pub enabled: bool,
    pub verified: bool,
}

impl AdvertisementDraft {
    #[must_use]
    pub fn new<I, S>(title: impl Into<String>, contact: I, address: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            description: None,
            contact: contact.into_iter().map(Into::into).collect(),
            address: address.into(),
            links: AdvertisementLinks::default(),
            enabled: true,
            verified: false,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn links(mut self, links: AdvertisementLinks) -> Self {
        self.links = links;
        self
    }
}

///
/// AdvertisementPatch
///
/// Nested options clear the field when set to `Some(None)`.
///

#[derive(Clone, Debug, Default)]
pub struct AdvertisementPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub contact: Option<Vec<String>>,
    pub address: Option<String>,
    pub map: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub facebook: Option<Option<String>>,
    pub telegram: Option<Option<String>>,
    pub tiktok: Option<Option<String>>,
    pub enabled: Option<bool>,
    pub verified: Option<bool>,
}

fn patch_optional(slot: &mut Option<String>, value: Option<Option<String>>) {
    if let Some(value) = value {
        *slot = normalize_optional(value);
    }
}

impl EntityKind for Advertisement {
    type Draft = AdvertisementDraft;
    type Patch = AdvertisementPatch;

    const MODEL: &'static EntityModel = &EntityModel {
        path: "custom_ads",
        fields: &[
            "title",
            "titleLower",
            "description",
            "contact",
            "address",
            "map",
            "image",
            "website",
            "facebook",
            "telegram",
            "tiktok",
            "enabled",
            "verified",
            "keywords",
        ],
        ordered: &["title", "titleLower"],
        filters: &["enabled", "verified"],
        lowercase: &["titleLower"],
        search_field: "titleLower",
    };

    fn from_draft(draft: AdvertisementDraft) -> Self {
        let links = draft.links;

        Self {
            title: draft.title.trim().to_string(),
            title_lower: String::new(),
            description: normalize_optional(draft.description),
            contact: normalize_list(draft.contact),
            address: draft.address.trim().to_string(),
            map: normalize_optional(links.map),
            image: normalize_optional(links.image),
            website: normalize_optional(links.website),
            facebook: normalize_optional(links.facebook),
            telegram: normalize_optional(links.telegram),
            tiktok: normalize_optional(links.tiktok),
            enabled: draft.enabled,
            verified: draft.verified,
            keywords: KeywordSet::new(),
        }
    }

    fn apply_patch(&mut self, patch: AdvertisementPatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        patch_optional(&mut self.description, patch.description);
        if let Some(contact) = patch.contact {
            self.contact = normalize_list(contact);
        }
        if let Some(address) = patch.address {
            self.address = address.trim().to_string();
        }
        patch_optional(&mut self.map, patch.map);
        patch_optional(&mut self.image, patch.image);
        patch_optional(&mut self.website, patch.website);
        patch_optional(&mut self.facebook, patch.facebook);
        patch_optional(&mut self.telegram, patch.telegram);
        patch_optional(&mut self.tiktok, patch.tiktok);
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(verified) = patch.verified {
            self.verified = verified;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let path = Self::MODEL.path;
        require_text(path, "title", &self.title)?;
        if self.contact.is_empty() {
            return Err(ValidationError::required(path, "contact"));
        }
        require_text(path, "address", &self.address)?;

        Ok(())
    }

    fn keyword_sources(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.title),
            self.description.as_deref(),
            Some(&self.address),
        ]
    }

    fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    fn set_keywords(&mut self, keywords: KeywordSet) {
        self.keywords = keywords;
    }

    fn refresh_lowercase(&mut self) {
        self.title_lower = self.title.to_lowercase();
    }

    fn value(&self, field: &str) -> Option<Value> {
        let optional = |value: &Option<String>| value.as_deref().map(Value::from);

        match field {
            "title" => Some(Value::text(&self.title)),
            "titleLower" => Some(Value::text(&self.title_lower)),
            "description" => optional(&self.description),
            "contact" => Some(Value::TextList(self.contact.clone())),
            "address" => Some(Value::text(&self.address)),
            "map" => optional(&self.map),
            "image" => optional(&self.image),
            "website" => optional(&self.website),
            "facebook" => optional(&self.facebook),
            "telegram" => optional(&self.telegram),
            "tiktok" => optional(&self.tiktok),
            "enabled" => Some(Value::Bool(self.enabled)),
            "verified" => Some(Value::Bool(self.verified)),
            "keywords" => Some(Value::TextList(self.keywords.iter().cloned().collect())),
            _ => None,
        }
    }

    fn collection(collections: &Collections) -> &CollectionState<Self> {
        &collections.advertisements
    }

    fn collection_mut(collections: &mut Collections) -> &mut CollectionState<Self> {
        &mut collections.advertisements
    }
}

impl Verifiable for Advertisement {
    fn verified(&self) -> bool {
        self.verified
    }

    fn verified_patch(verified: bool) -> AdvertisementPatch {
        AdvertisementPatch {
            verified: Some(verified),
            ..AdvertisementPatch::default()
        }
    }
}

impl Advertisement {
    #[must_use]
    pub fn enabled_patch(enabled: bool) -> AdvertisementPatch {
        AdvertisementPatch {
            enabled: Some(enabled),
            ..AdvertisementPatch::default()
        }
    }
}
