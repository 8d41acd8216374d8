pub mod auth;

use serde::Serialize;
use uuid::Uuid;

use crate::city::permission::Role;

/// Identifies one login. Async work started for a session carries its token
/// and is discarded if the token is no longer current when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "role", rename_all = "lowercase")]
pub enum RoleState {
    Pending,
    Resolved(Role),
}

impl RoleState {
    pub fn role(self) -> Option<Role> {
        match self {
            RoleState::Pending => None,
            RoleState::Resolved(role) => Some(role),
        }
    }
}

/// Authenticated identity as returned by an [`auth::Authenticator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

/// Lives from a successful login until logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub token: SessionToken,
    pub user_id: String,
    pub email: String,
    pub role: RoleState,
    /// Set once the session's building list has been applied to the grid.
    pub buildings_loaded: bool,
}

impl SessionContext {
    pub fn open(identity: Identity) -> Self {
        Self {
            token: SessionToken::new(),
            user_id: identity.user_id,
            email: identity.email,
            role: RoleState::Pending,
            buildings_loaded: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = RoleState::Resolved(role);
        self
    }

    pub fn with_buildings_loaded(mut self) -> Self {
        self.buildings_loaded = true;
        self
    }
}
