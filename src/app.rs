//! App Core for Vault.
//!
//! Central struct holding the settings, theme and notification state, the local
//! store and the bookmark session of the signed-in user. Every field uses
//! interior mutability so the RPC server can serve requests concurrently from a
//! shared `Arc<App>`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;
use tracing::{info, warn};

use crate::database::LocalStore;
use crate::managers::notification_center::NotificationCenter;
use crate::managers::vault_session::{SessionOptions, VaultSession};
use crate::services::identity_service::{IdentityService, LocalIdentity};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::theme_engine::ThemeEngine;
use crate::types::errors::SessionError;

/// Central application struct holding all managers and services.
pub struct App {
    pub settings_engine: Mutex<SettingsEngine>,
    pub theme_engine: Mutex<ThemeEngine>,
    pub notifications: Mutex<NotificationCenter>,
    pub identity: Arc<dyn IdentityService>,
    pub store: Arc<LocalStore>,
    session: Mutex<Option<Arc<VaultSession>>>,
}

/// Locks a mutex, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl App {
    /// Creates a new App with the store at `db_path` and settings from the
    /// default (or `VAULT_CONFIG`) location.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let store = Arc::new(LocalStore::open(db_path)?);
        let mut settings_engine = SettingsEngine::new(None);
        if let Err(e) = settings_engine.load() {
            warn!(error = %e, "settings unreadable; using defaults");
        }
        Ok(Self::from_parts(settings_engine, store))
    }

    /// Assembles an App from an already loaded settings engine and a store.
    pub fn from_parts(settings_engine: SettingsEngine, store: Arc<LocalStore>) -> Self {
        let settings = settings_engine.get_settings().clone();
        let identity: Arc<dyn IdentityService> = Arc::new(LocalIdentity::from_settings(&settings.account));
        Self {
            theme_engine: Mutex::new(ThemeEngine::new(settings.appearance.theme.clone())),
            notifications: Mutex::new(NotificationCenter::from_settings(&settings.notifications)),
            settings_engine: Mutex::new(settings_engine),
            identity,
            store,
            session: Mutex::new(None),
        }
    }

    /// Startup sequence: start the bookmark session for the configured user.
    ///
    /// A failed initial load is reported as a toast; the session stays usable
    /// and `bookmark.reload` retries.
    pub async fn startup(&self) -> Result<(), SessionError> {
        let options = SessionOptions::from_settings(&lock(&self.settings_engine).get_settings().sync);
        let session = VaultSession::start(
            Arc::clone(&self.identity),
            self.store.clone(),
            self.store.clone(),
            options,
        )
        .await;
        let session = self.report("Couldn't start session", session)?;

        if let Some(err) = session.load_error() {
            lock(&self.notifications).error("Couldn't load bookmarks", &err.to_string());
        }
        info!(owner = %session.identity().id, "app started");
        if let Some(previous) = lock(&self.session).replace(Arc::new(session)) {
            previous.dispose();
        }
        Ok(())
    }

    /// The live session, or `AuthRequired` when nobody is signed in.
    pub fn session(&self) -> Result<Arc<VaultSession>, SessionError> {
        lock(&self.session).clone().ok_or(SessionError::AuthRequired)
    }

    /// Signs out, disposes the session and forgets the configured account.
    pub async fn sign_out(&self) -> Result<(), String> {
        self.identity.sign_out().await.map_err(|e| e.to_string())?;
        if let Some(session) = lock(&self.session).take() {
            session.dispose();
        }
        let mut settings = lock(&self.settings_engine);
        settings
            .set_value("account", json!({"user_id": null, "email": null}))
            .map_err(|e| e.to_string())?;
        info!("signed out");
        Ok(())
    }

    /// Passes `result` through, pushing an error toast titled `title` when it failed.
    pub fn report<T>(&self, title: &str, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(err) = &result {
            lock(&self.notifications).error(title, &err.to_string());
        }
        result
    }

    /// Shutdown sequence: dispose the session and persist settings.
    pub fn shutdown(&self) {
        if let Some(session) = lock(&self.session).take() {
            session.dispose();
        }
        if let Err(e) = lock(&self.settings_engine).save() {
            warn!(error = %e, "failed to save settings on shutdown");
        }
    }
}
