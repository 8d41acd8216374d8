use serde::{Deserialize, Serialize};

use crate::blueprint::BuildingKind;
use crate::city::{BuildingDetails, CityError, CitySnapshot, Commit, Filter, ResourceKind, Role};

#[derive(Deserialize, Debug, Clone)]
pub struct ApiRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialsParams {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SignupParams {
    pub email: String,
    pub password: String,
    pub confirm: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    Role::Builder.as_str().to_string()
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CellParams {
    pub row: usize,
    pub col: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChooseParams {
    pub icon: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub category: String,
}

/// Blank fields are left out of the top-up.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TopUpParams {
    pub budget: Option<i64>,
    pub materials: Option<i64>,
    pub workers: Option<i64>,
}

impl TopUpParams {
    pub fn amounts(&self) -> Vec<(ResourceKind, Option<i64>)> {
        vec![
            (ResourceKind::Budget, self.budget),
            (ResourceKind::Materials, self.materials),
            (ResourceKind::Workers, self.workers),
        ]
    }
}

/// A request decoded into the operation it names.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(CredentialsParams),
    Signup { params: SignupParams, role: Role },
    Logout,
    Select(CellParams),
    ClearSelection,
    Choose(BuildingKind),
    Filter(Filter),
    TopUp(TopUpParams),
    Build,
    Details(CellParams),
    Snapshot,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown method {0}")]
    UnknownMethod(String),
    #[error("unknown building icon {0}")]
    UnknownIcon(String),
    #[error("unknown role {0}, expected admin or builder")]
    UnknownRole(String),
}

impl ApiRequest {
    pub fn from_text(text: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn call(&self) -> Result<Call, RequestError> {
        let params = || self.params.clone();
        let call = match self.method.as_str() {
            "login" => Call::Login(serde_json::from_value(params())?),
            "signup" => {
                let params: SignupParams = serde_json::from_value(params())?;
                let role = match Role::parse(&params.role) {
                    Role::Unknown => return Err(RequestError::UnknownRole(params.role)),
                    role => role,
                };
                Call::Signup { params, role }
            }
            "logout" => Call::Logout,
            "select" => Call::Select(serde_json::from_value(params())?),
            "clear_selection" => Call::ClearSelection,
            "choose" => {
                let ChooseParams { icon } = serde_json::from_value(params())?;
                let kind = BuildingKind::from_icon(&icon).ok_or(RequestError::UnknownIcon(icon))?;
                Call::Choose(kind)
            }
            "filter" => {
                let FilterParams { category } = serde_json::from_value(params())?;
                Call::Filter(Filter::from_category(&category))
            }
            "top_up" => Call::TopUp(serde_json::from_value(params())?),
            "build" => Call::Build,
            "details" => Call::Details(serde_json::from_value(params())?),
            "snapshot" => Call::Snapshot,
            other => return Err(RequestError::UnknownMethod(other.to_string())),
        };
        Ok(call)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApiError {
    pub kind: &'static str,
    pub message: String,
}

impl From<&CityError> for ApiError {
    fn from(e: &CityError) -> Self {
        let message = match e {
            CityError::Persistence(_) => format!("{e}; the change was not saved and has been undone"),
            _ => e.to_string(),
        };
        Self {
            kind: e.kind(),
            message,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiResponse {
    Snapshot {
        id: String,
        snapshot: CitySnapshot,
    },
    Committed {
        id: String,
        commit: Commit,
        snapshot: CitySnapshot,
    },
    Details {
        id: String,
        details: Option<BuildingDetails>,
    },
    Error {
        id: Option<String>,
        error: ApiError,
    },
    /// Unsolicited update after a background load.
    Update {
        snapshot: CitySnapshot,
    },
}

impl ApiResponse {
    pub fn error(id: Option<String>, kind: &'static str, message: impl Into<String>) -> Self {
        ApiResponse::Error {
            id,
            error: ApiError {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn as_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
