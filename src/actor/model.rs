use tokio::sync::oneshot;

use crate::blueprint::BuildingKind;
use crate::city::{BuildingDetails, CityError, CitySnapshot, Commit, Filter, ResourceKind, Role};
use crate::persistence::{BuildingRecord, PersistenceError};
use crate::session::SessionToken;
use crate::session::auth::AuthError;

pub type Reply<T> = oneshot::Sender<Result<T, CityError>>;

#[derive(Debug)]
pub enum InternalMessage {
    Login {
        email: String,
        password: String,
        respond_to: Reply<CitySnapshot>,
    },
    Signup {
        email: String,
        password: String,
        confirm: String,
        role: Role,
        respond_to: Reply<CitySnapshot>,
    },
    Logout {
        respond_to: Reply<CitySnapshot>,
    },
    Select {
        row: usize,
        col: usize,
        respond_to: Reply<CitySnapshot>,
    },
    ClearSelection {
        respond_to: Reply<CitySnapshot>,
    },
    Choose {
        kind: BuildingKind,
        respond_to: Reply<CitySnapshot>,
    },
    SetFilter {
        filter: Filter,
        respond_to: Reply<CitySnapshot>,
    },
    TopUp {
        amounts: Vec<(ResourceKind, Option<i64>)>,
        respond_to: Reply<CitySnapshot>,
    },
    BuildOrUpgrade {
        respond_to: Reply<(Commit, CitySnapshot)>,
    },
    Details {
        row: usize,
        col: usize,
        respond_to: Reply<Option<BuildingDetails>>,
    },
    Snapshot {
        respond_to: Reply<CitySnapshot>,
    },
    RoleResolved {
        token: SessionToken,
        result: Result<Role, AuthError>,
    },
    BuildingsLoaded {
        token: SessionToken,
        result: Result<Vec<BuildingRecord>, PersistenceError>,
    },
    Stop,
}

/// Pushed to the client without a request, after background loads land.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SessionUpdated(CitySnapshot),
    LoadFailed(CityError),
}
