use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Build,
    Upgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Builder,
    Unknown,
}

impl Role {
    /// Profile documents store the role as free text; anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Role {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "builder" => Role::Builder,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Builder => "builder",
            Role::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Build => f.write_str("build"),
            Action::Upgrade => f.write_str("upgrade"),
        }
    }
}

/// `None` stands for a role that is not known: no session, or a role lookup still in flight.
pub fn can_perform(action: Action, role: Option<Role>) -> bool {
    match (action, role) {
        (Action::Build, Some(Role::Admin)) => true,
        (Action::Upgrade, Some(Role::Admin | Role::Builder)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gating() {
        assert!(can_perform(Action::Build, Some(Role::Admin)));
        assert!(can_perform(Action::Upgrade, Some(Role::Admin)));
        assert!(!can_perform(Action::Build, Some(Role::Builder)));
        assert!(can_perform(Action::Upgrade, Some(Role::Builder)));
        assert!(!can_perform(Action::Build, Some(Role::Unknown)));
        assert!(!can_perform(Action::Upgrade, Some(Role::Unknown)));
    }

    #[test]
    fn test_undetermined_role_is_denied() {
        assert!(!can_perform(Action::Build, None));
        assert!(!can_perform(Action::Upgrade, None));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse(" Builder "), Role::Builder);
        assert_eq!(Role::parse("mayor"), Role::Unknown);
        assert_eq!(Role::parse(""), Role::Unknown);
    }
}
