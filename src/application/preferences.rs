use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::ports::{load_json, save_json, LocalStore};

pub const THEME_KEY: &str = "ptms_theme";
pub const SIDEBAR_KEY: &str = "sidebarCollapsed";
pub const VIEW_MODE_KEY: &str = "viewMode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grid,
    #[default]
    List,
    Board,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Grid, ViewMode::List, ViewMode::Board];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
            ViewMode::Board => "board",
        }
    }

    /// Next mode in display order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Board,
            ViewMode::Board => ViewMode::Grid,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DomainError::InvalidViewMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceValues {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub view_mode: ViewMode,
}

/// UI preferences. Each value lives under its own storage key and is
/// written back as soon as it changes.
pub struct Preferences {
    storage: Arc<dyn LocalStore>,
    values: RwLock<PreferenceValues>,
}

fn load_or_default<T>(storage: &dyn LocalStore, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match load_json(storage, key) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Ignoring stored {}: {}", key, e);
            T::default()
        }
    }
}

impl Preferences {
    pub fn load(storage: Arc<dyn LocalStore>) -> Self {
        let values = PreferenceValues {
            theme: load_or_default(storage.as_ref(), THEME_KEY),
            sidebar_collapsed: load_or_default(storage.as_ref(), SIDEBAR_KEY),
            view_mode: load_or_default(storage.as_ref(), VIEW_MODE_KEY),
        };
        Self {
            storage,
            values: RwLock::new(values),
        }
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = save_json(self.storage.as_ref(), key, value) {
            tracing::error!("Failed to save {}: {}", key, e);
        }
    }

    pub async fn values(&self) -> PreferenceValues {
        *self.values.read().await
    }

    pub async fn toggle_theme(&self) -> Theme {
        let mut values = self.values.write().await;
        values.theme = values.theme.toggled();
        self.persist(THEME_KEY, &values.theme);
        values.theme
    }

    pub async fn toggle_sidebar(&self) -> bool {
        let mut values = self.values.write().await;
        values.sidebar_collapsed = !values.sidebar_collapsed;
        self.persist(SIDEBAR_KEY, &values.sidebar_collapsed);
        values.sidebar_collapsed
    }

    pub async fn set_view_mode(&self, mode: ViewMode) {
        let mut values = self.values.write().await;
        values.view_mode = mode;
        self.persist(VIEW_MODE_KEY, &values.view_mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryLocalStore;

    #[tokio::test]
    async fn test_defaults_when_nothing_stored() {
        let prefs = Preferences::load(Arc::new(MemoryLocalStore::new()));
        assert_eq!(
            prefs.values().await,
            PreferenceValues {
                theme: Theme::Dark,
                sidebar_collapsed: false,
                view_mode: ViewMode::List,
            }
        );
    }

    #[tokio::test]
    async fn test_changes_are_written_under_their_own_keys() {
        let storage = Arc::new(MemoryLocalStore::new());
        let prefs = Preferences::load(storage.clone());

        assert_eq!(prefs.toggle_theme().await, Theme::Light);
        assert!(prefs.toggle_sidebar().await);
        prefs.set_view_mode(ViewMode::Board).await;

        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("\"light\""));
        assert_eq!(storage.get(SIDEBAR_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(storage.get(VIEW_MODE_KEY).unwrap().as_deref(), Some("\"board\""));

        let reloaded = Preferences::load(storage);
        assert_eq!(reloaded.values().await.view_mode, ViewMode::Board);
        assert_eq!(reloaded.values().await.theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_bad_value_only_resets_its_own_key() {
        let storage = Arc::new(MemoryLocalStore::new());
        storage.set(THEME_KEY, "\"purple\"").unwrap();
        storage.set(SIDEBAR_KEY, "true").unwrap();

        let prefs = Preferences::load(storage);
        let values = prefs.values().await;
        assert_eq!(values.theme, Theme::Dark);
        assert!(values.sidebar_collapsed);
    }

    #[test]
    fn test_view_mode_parsing() {
        assert_eq!("grid".parse::<ViewMode>().unwrap(), ViewMode::Grid);
        assert!("table".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::Board.cycle(), ViewMode::Grid);
    }
}
