//! Notification Center: short-lived toasts for errors and confirmations.
//!
//! Times are milliseconds since the UNIX epoch so toasts can be serialized
//! straight onto the RPC channel.

use std::collections::VecDeque;

use chrono::Utc;

use crate::types::notification::{Toast, ToastLevel};
use crate::types::settings::NotificationSettings;

pub const DEFAULT_TIMEOUT_MS: i64 = 5_000;
pub const DEFAULT_MAX_VISIBLE: usize = 4;

/// Trait defining the notification center interface.
pub trait NotificationCenterTrait {
    /// Queues a toast and returns its ID. Repeating the newest message only
    /// refreshes its expiry.
    fn push(&mut self, level: ToastLevel, title: &str, message: &str, now_ms: i64) -> u64;
    fn dismiss(&mut self, id: u64) -> bool;
    /// Drops expired toasts; returns how many were removed.
    fn expire(&mut self, now_ms: i64) -> usize;
    fn active(&self, now_ms: i64) -> Vec<Toast>;
}

pub struct NotificationCenter {
    toasts: VecDeque<Toast>,
    timeout_ms: i64,
    max_visible: usize,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new(timeout_ms: i64, max_visible: usize) -> Self {
        let max_visible = max_visible.max(1);
        Self {
            toasts: VecDeque::with_capacity(max_visible),
            timeout_ms: timeout_ms.max(0),
            max_visible,
            next_id: 1,
        }
    }

    pub fn from_settings(settings: &NotificationSettings) -> Self {
        Self::new(
            i64::try_from(settings.timeout_ms).unwrap_or(DEFAULT_TIMEOUT_MS),
            settings.max_visible,
        )
    }

    pub fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(&mut self, title: &str, message: &str) -> u64 {
        self.push(ToastLevel::Error, title, message, Self::now_ms())
    }

    pub fn info(&mut self, title: &str, message: &str) -> u64 {
        self.push(ToastLevel::Info, title, message, Self::now_ms())
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS, DEFAULT_MAX_VISIBLE)
    }
}

impl NotificationCenterTrait for NotificationCenter {
    fn push(&mut self, level: ToastLevel, title: &str, message: &str, now_ms: i64) -> u64 {
        let expires_at = now_ms + self.timeout_ms;
        if let Some(last) = self.toasts.back_mut() {
            if last.level == level && last.title == title && last.message == message {
                last.expires_at = expires_at;
                return last.id;
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push_back(Toast {
            id,
            level,
            title: title.to_string(),
            message: message.to_string(),
            expires_at,
        });
        while self.toasts.len() > self.max_visible {
            self.toasts.pop_front();
        }
        id
    }

    fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    fn expire(&mut self, now_ms: i64) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at > now_ms);
        before - self.toasts.len()
    }

    fn active(&self, now_ms: i64) -> Vec<Toast> {
        self.toasts
            .iter()
            .filter(|t| t.expires_at > now_ms)
            .cloned()
            .collect()
    }
}
