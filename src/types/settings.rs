use serde::{Deserialize, Serialize};

/// Top-level vault settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VaultSettings {
    pub account: AccountSettings,
    pub sync: SyncSettings,
    pub appearance: AppearanceSettings,
    pub notifications: NotificationSettings,
}

/// The locally configured identity used by the settings-backed identity service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AccountSettings {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// How local mutations are reconciled with the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub strategy: SyncStrategy,
    /// How long the "syncing" indicator stays up after a remote change.
    #[serde(default = "default_sync_indicator_ms")]
    pub sync_indicator_ms: u64,
}

fn default_sync_indicator_ms() -> u64 {
    600
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            strategy: SyncStrategy::Optimistic,
            sync_indicator_ms: default_sync_indicator_ms(),
        }
    }
}

/// Create/delete strategy of the view-model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Apply locally first, reconcile when the store answers.
    Optimistic,
    /// Apply locally only after the store confirms.
    Pessimistic,
}

/// Appearance and layout settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppearanceSettings {
    pub theme: ThemeMode,
    pub view_mode: ViewMode,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            view_mode: ViewMode::Grid,
        }
    }
}

/// Theme mode selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ThemeMode {
    Dark,
    Light,
    System,
}

/// Bookmark list layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViewMode {
    Grid,
    List,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

/// Toast notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    pub timeout_ms: u64,
    pub max_visible: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_visible: 4,
        }
    }
}
