use serde::{Deserialize, Serialize};

///
/// AppConfig
///
/// Singleton settings record stored under a fixed id. Reads fall back to
/// the defaults until the first merge creates it.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub maintenance_on: bool,
    pub maintenance_message: String,
    pub welcome_message: String,
}

impl AppConfig {
    pub const ID: &'static str = "main_settings";

    /// Overwrite only the fields the patch carries.
    pub fn merge(&mut self, patch: AppConfigPatch) {
        if let Some(on) = patch.maintenance_on {
            self.maintenance_on = on;
        }
        if let Some(message) = patch.maintenance_message {
            self.maintenance_message = message;
        }
        if let Some(message) = patch.welcome_message {
            self.welcome_message = message;
        }
    }
}

///
/// AppConfigPatch
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

impl AppConfigPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maintenance_on.is_none()
            && self.maintenance_message.is_none()
            && self.welcome_message.is_none()
    }
}
