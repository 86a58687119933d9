use crate::{
    db::CatalogStore,
    entity::{AppConfig, AppConfigPatch},
};
use tokio::sync::watch;
use tracing::debug;

///
/// SettingsState
///
/// The app-config singleton plus the channel its watchers read from. The
/// channel is seeded with defaults so watchers never wait for a first
/// value.
///

#[derive(Debug)]
pub(crate) struct SettingsState {
    record: Option<AppConfig>,
    sender: watch::Sender<AppConfig>,
}

impl Default for SettingsState {
    fn default() -> Self {
        let (sender, _) = watch::channel(AppConfig::default());

        Self {
            record: None,
            sender,
        }
    }
}

impl CatalogStore {
    /// Stored app config, or defaults before the first write.
    #[must_use]
    pub fn app_config(&self) -> AppConfig {
        self.read().settings.record.clone().unwrap_or_default()
    }

    /// `true` once a merge has created the singleton record.
    #[must_use]
    pub fn app_config_exists(&self) -> bool {
        self.read().settings.record.is_some()
    }

    /// Merge the fields present in `patch`, creating the record on first
    /// write. Returns the merged record.
    pub fn merge_app_config(&self, patch: AppConfigPatch) -> AppConfig {
        let mut guard = self.write();
        let settings = &mut guard.settings;

        let mut merged = settings.record.clone().unwrap_or_default();
        merged.merge(patch);
        settings.record = Some(merged.clone());
        settings.sender.send_if_modified(|current| {
            if *current == merged {
                return false;
            }
            current.clone_from(&merged);
            true
        });
        debug!(id = AppConfig::ID, "app config merged");

        merged
    }

    #[must_use]
    pub fn subscribe_app_config(&self) -> watch::Receiver<AppConfig> {
        self.read().settings.sender.subscribe()
    }
}
