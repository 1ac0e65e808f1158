use std::fmt;

// === BookmarkError ===

/// Errors surfaced by bookmark view-model and session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkError {
    /// User input was rejected locally; nothing was sent to the store.
    Validation(String),
    /// No signed-in identity; the caller should redirect to sign-in.
    AuthRequired,
    /// The store refused the mutation.
    StoreRejected(String),
    /// The store could not be reached or did not answer.
    StoreUnavailable(String),
    /// No bookmark with the given ID is held locally.
    NotFound(String),
    /// The bookmark is still waiting for store confirmation.
    Pending(String),
    /// The session owning the view-model has been disposed.
    SessionClosed,
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::Validation(msg) => write!(f, "Invalid bookmark: {}", msg),
            BookmarkError::AuthRequired => write!(f, "Sign-in required"),
            BookmarkError::StoreRejected(msg) => write!(f, "{}", msg),
            BookmarkError::StoreUnavailable(msg) => write!(f, "Bookmarks unavailable: {}", msg),
            BookmarkError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            BookmarkError::Pending(id) => write!(f, "Bookmark is still being saved: {}", id),
            BookmarkError::SessionClosed => write!(f, "Bookmark session is closed"),
        }
    }
}

impl std::error::Error for BookmarkError {}

impl From<StoreError> for BookmarkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(msg) => BookmarkError::StoreRejected(msg),
            StoreError::Unavailable(msg) => BookmarkError::StoreUnavailable(msg),
        }
    }
}

// === StoreError ===

/// Errors reported by a data store implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store processed the request and refused it.
    Rejected(String),
    /// The store could not process the request at all.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Rejected(msg) => write!(f, "Store rejected request: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

// === FeedError ===

/// Errors related to change-feed subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The feed refused or failed to register the subscription.
    SubscribeFailed(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::SubscribeFailed(msg) => write!(f, "Change feed subscription failed: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

// === IdentityError ===

/// Errors related to the identity service.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityError {
    /// Signing out failed.
    SignOutFailed(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::SignOutFailed(msg) => write!(f, "Sign-out failed: {}", msg),
        }
    }
}

impl std::error::Error for IdentityError {}

// === SessionError ===

/// Errors raised while starting or tearing down a vault session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// No signed-in identity.
    AuthRequired,
    /// The change feed could not be subscribed.
    Feed(FeedError),
    /// The session was already disposed.
    Disposed,
    /// A bookmark operation failed inside a live session.
    Bookmark(BookmarkError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AuthRequired => write!(f, "Sign-in required"),
            SessionError::Feed(err) => write!(f, "Session setup failed: {}", err),
            SessionError::Disposed => write!(f, "Session already disposed"),
            SessionError::Bookmark(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Feed(err) => Some(err),
            SessionError::Bookmark(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FeedError> for SessionError {
    fn from(err: FeedError) -> Self {
        SessionError::Feed(err)
    }
}

impl From<BookmarkError> for SessionError {
    fn from(err: BookmarkError) -> Self {
        match err {
            BookmarkError::SessionClosed => SessionError::Disposed,
            BookmarkError::AuthRequired => SessionError::AuthRequired,
            other => SessionError::Bookmark(other),
        }
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === ThemeError ===

/// Errors related to theme management.
#[derive(Debug)]
pub enum ThemeError {
    /// The theme name could not be parsed.
    UnknownTheme(String),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeError::UnknownTheme(name) => write!(f, "Unknown theme: {}", name),
        }
    }
}

impl std::error::Error for ThemeError {}
