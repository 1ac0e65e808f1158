//! Identity service contract and a settings-backed implementation.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::errors::IdentityError;
use crate::types::identity::Identity;
use crate::types::settings::AccountSettings;

/// Trait defining the identity operations the vault depends on.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// The signed-in user, or `None` when the caller must go to sign-in.
    async fn current_user(&self) -> Option<Identity>;
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Identity service that reports the account configured in settings.
///
/// Sign-in itself happens elsewhere; signing out forgets the identity for the
/// lifetime of this service.
pub struct LocalIdentity {
    current: Mutex<Option<Identity>>,
}

impl LocalIdentity {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            current: Mutex::new(identity),
        }
    }

    /// Builds the identity from the `account` settings section.
    pub fn from_settings(account: &AccountSettings) -> Self {
        let identity = account
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Identity {
                id: id.to_string(),
                email: account.email.clone(),
            });
        Self::new(identity)
    }
}

#[async_trait]
impl IdentityService for LocalIdentity {
    async fn current_user(&self) -> Option<Identity> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let mut guard = self
            .current
            .lock()
            .map_err(|e| IdentityError::SignOutFailed(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}
