//! Module: entity
//! Responsibility: the five catalog record shapes and their write-time rules.
//! Does not own: persistence or reference lookups (see `db`).
//!
//! Field names serialize in camelCase and are part of the wire contract
//! shared with the CSV transfer crate.

mod advertisement;
mod app_config;
mod facility;
mod operator;
mod terminal;
#[cfg(test)]
mod tests;

pub use advertisement::{
    Advertisement, AdvertisementDraft, AdvertisementLinks, AdvertisementPatch,
};
pub use app_config::{AppConfig, AppConfigPatch};
pub use facility::{Facility, FacilityDraft, FacilityPatch, FacilityType};
pub use operator::{Operator, OperatorDraft, OperatorPatch};
pub use terminal::{Terminal, TerminalDraft, TerminalPatch};

use crate::error::ValidationError;

/// Trim every entry and drop the blank ones.
pub(crate) fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Normalize an optional free-text field; blank collapses to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn require_text(
    collection: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(collection, field));
    }

    Ok(())
}
