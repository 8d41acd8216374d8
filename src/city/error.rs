use crate::blueprint::{BuildingKind, Cost};
use crate::city::permission::{Action, Role};
use crate::persistence::PersistenceError;
use crate::session::auth::AuthError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CityError {
    #[error("amount must be a positive number, got {0}")]
    Validation(i64),
    #[error("no cell selected")]
    NoSelection,
    #[error("you must be logged in")]
    Unauthenticated,
    #[error("role has not been resolved yet")]
    RoleUndetermined,
    #[error("buildings are still loading")]
    BuildingsLoading,
    #[error("role {role} may not {action}")]
    PermissionDenied { action: Action, role: Role },
    #[error("{0} cannot be upgraded")]
    NotUpgradable(BuildingKind),
    #[error("{0} cannot be built directly")]
    NotBuildable(BuildingKind),
    #[error("insufficient resources: need {required}, have {available}")]
    InsufficientResources { required: Cost, available: Cost },
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("city is no longer running")]
    ActorUnavailable,
}

impl CityError {
    /// Short machine-readable tag for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            CityError::Validation(_) => "validation",
            CityError::NoSelection => "no_selection",
            CityError::Unauthenticated => "unauthenticated",
            CityError::RoleUndetermined => "role_undetermined",
            CityError::BuildingsLoading => "buildings_loading",
            CityError::PermissionDenied { .. } => "permission_denied",
            CityError::NotUpgradable(_) => "not_upgradable",
            CityError::NotBuildable(_) => "not_buildable",
            CityError::InsufficientResources { .. } => "insufficient_resources",
            CityError::OutOfBounds { .. } => "out_of_bounds",
            CityError::Persistence(_) => "persistence",
            CityError::Auth(_) => "auth",
            CityError::ActorUnavailable => "unavailable",
        }
    }
}
