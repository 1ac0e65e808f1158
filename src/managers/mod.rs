// Vault state managers
// Managers own mutable state: the bookmark view-model, its async session and the toast queue.

pub mod bookmark_view_model;
pub mod notification_center;
pub mod pending_mutation;
pub mod vault_session;
