use serde::{Deserialize, Serialize};

use super::role::Role;

/// The signed-in user as restored from the profile API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// `None` when the API sent a role outside the closed set.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn new<S: Into<String>>(id: S, role: Option<Role>) -> Self {
        Identity { id: id.into(), role, ..Default::default() }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}
