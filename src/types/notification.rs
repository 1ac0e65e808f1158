use serde::{Deserialize, Serialize};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Error,
}

/// A transient, dismissable notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    /// Milliseconds since the UNIX epoch after which the toast is hidden.
    pub expires_at: i64,
}
