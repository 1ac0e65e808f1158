use serde::{Deserialize, Serialize};

/// The signed-in user, as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}
