pub mod engine;
pub mod error;
pub mod filter;
pub mod grid;
pub mod ledger;
pub mod permission;

use serde::Serialize;

use crate::blueprint::{BuildingKind, Category, Cost};
use crate::persistence::model::placements_for;
use crate::persistence::{BuildingRecord, BuildingStore, PersistenceError};
use crate::session::auth::AuthError;
use crate::session::{Identity, RoleState, SessionContext, SessionToken};

pub use engine::Commit;
pub use error::CityError;
pub use filter::Filter;
pub use grid::{Grid, Position};
pub use ledger::{Ledger, ResourceKind, Resources};
pub use permission::{Action, Role};

/// Whether an async completion was applied or dropped because its session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingDetails {
    pub position: Position,
    pub kind: BuildingKind,
    pub icon: &'static str,
    pub category: Category,
    pub level: u8,
    pub invested: Cost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: String,
    pub email: String,
    pub role: RoleState,
    pub buildings_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySnapshot {
    pub grid: Vec<Vec<Option<&'static str>>>,
    pub selection: Option<Position>,
    pub resources: Resources,
    pub filter: Filter,
    pub chosen: BuildingKind,
    pub buildings: usize,
    pub session: Option<SessionView>,
}

/// One client's city: the grid, its resources and the current session.
#[derive(Debug, Clone)]
pub struct City {
    grid: Grid,
    ledger: Ledger,
    filter: Filter,
    chosen: BuildingKind,
    session: Option<SessionContext>,
    starting: Resources,
}

impl City {
    pub fn new(starting: Resources) -> Self {
        Self {
            grid: Grid::new(),
            ledger: Ledger::new(starting),
            filter: Filter::All,
            chosen: BuildingKind::House,
            session: None,
            starting,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn chosen(&self) -> BuildingKind {
        self.chosen
    }

    pub fn select(&mut self, row: usize, col: usize) -> Result<Position, CityError> {
        let position = Position::new(row, col)?;
        self.grid.select(position);
        Ok(position)
    }

    pub fn clear_selection(&mut self) {
        self.grid.clear_selection();
    }

    /// Picks the kind used for builds on empty cells.
    pub fn choose(&mut self, kind: BuildingKind) -> Result<(), CityError> {
        if kind.build_cost().is_none() {
            return Err(CityError::NotBuildable(kind));
        }
        self.chosen = kind;
        Ok(())
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.grid.clear_selection();
    }

    pub fn view(&self) -> Grid {
        filter::project(&self.grid, self.filter)
    }

    pub fn credit(&mut self, kind: ResourceKind, amount: i64) -> Result<Resources, CityError> {
        if self.session.is_none() {
            return Err(CityError::Unauthenticated);
        }
        self.ledger.credit(kind, amount)
    }

    /// Credits several counters at once. Blank entries are skipped; a single
    /// non-positive amount rejects the whole batch.
    pub fn top_up(&mut self, amounts: &[(ResourceKind, Option<i64>)]) -> Result<Resources, CityError> {
        if self.session.is_none() {
            return Err(CityError::Unauthenticated);
        }
        if let Some(amount) = amounts.iter().filter_map(|(_, amount)| *amount).find(|a| *a <= 0) {
            return Err(CityError::Validation(amount));
        }
        for (kind, amount) in amounts {
            if let Some(amount) = amount {
                self.ledger.credit(*kind, *amount)?;
            }
        }
        Ok(self.ledger.resources())
    }

    /// Starts a session with its role still unresolved. Whatever the previous
    /// session left on the grid and in the ledger is discarded.
    pub fn begin_session(&mut self, identity: Identity) -> SessionToken {
        self.reset();
        let session = SessionContext::open(identity);
        let token = session.token;
        tracing::info!(user_id = %session.user_id, %token, "session started");
        self.session = Some(session);
        token
    }

    pub fn end_session(&mut self) -> Option<SessionContext> {
        self.reset();
        let session = self.session.take();
        if let Some(session) = &session {
            tracing::info!(user_id = %session.user_id, "session ended");
        }
        session
    }

    fn reset(&mut self) {
        self.grid = Grid::new();
        self.ledger = Ledger::new(self.starting);
        self.filter = Filter::All;
        self.chosen = BuildingKind::House;
    }

    fn current(&mut self, token: SessionToken) -> Option<&mut SessionContext> {
        self.session.as_mut().filter(|session| session.token == token)
    }

    /// Applies the outcome of a role lookup. A failed lookup leaves the role
    /// pending, so every build or upgrade keeps being refused.
    pub fn resolve_role(&mut self, token: SessionToken, result: Result<Role, AuthError>) -> Completion {
        let Some(session) = self.current(token) else {
            tracing::debug!(%token, "discarding role for stale session");
            return Completion::Stale;
        };
        match result {
            Ok(role) => {
                tracing::info!(user_id = %session.user_id, %role, "role resolved");
                session.role = RoleState::Resolved(role);
            }
            Err(e) => {
                tracing::warn!(user_id = %session.user_id, "role lookup failed: {}", e);
            }
        }
        Completion::Applied
    }

    /// Replaces the grid with the session owner's buildings, once per
    /// session. Builds and upgrades are refused until this has happened, so
    /// the list can never overwrite a local commit. A failed or malformed
    /// load leaves the grid empty. The selection is kept either way.
    pub fn apply_buildings(
        &mut self,
        token: SessionToken,
        result: Result<Vec<BuildingRecord>, PersistenceError>,
    ) -> Result<Completion, CityError> {
        let Some(session) = self.current(token) else {
            tracing::debug!(%token, "discarding building list for stale session");
            return Ok(Completion::Stale);
        };
        if session.buildings_loaded {
            tracing::debug!(%token, "buildings already loaded for this session");
            return Ok(Completion::Stale);
        }
        session.buildings_loaded = true;
        let user_id = session.user_id.clone();

        let selection = self.grid.selection();
        let placements = result.and_then(|records| placements_for(&records, &user_id));
        let outcome = match placements {
            Ok(placements) => {
                self.grid = Grid::from_placements(placements);
                tracing::info!(%user_id, buildings = self.grid.occupied(), "buildings loaded");
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.grid = Grid::new();
                tracing::warn!(%user_id, "loading buildings failed: {}", e);
                Err(e.into())
            }
        };
        if let Some(position) = selection {
            self.grid.select(position);
        }
        outcome
    }

    /// Builds or upgrades at the current selection and persists the result.
    /// The local change is rolled back if the store does not accept it.
    pub async fn build_or_upgrade<S: BuildingStore>(&mut self, store: &S) -> Result<Commit, CityError> {
        let selection = self.grid.selection();
        let pending = engine::attempt(
            &mut self.grid,
            &mut self.ledger,
            selection,
            self.chosen,
            self.session.as_ref(),
        )
        .inspect_err(|e| tracing::warn!("transaction rejected: {}", e))?;

        match store.insert(pending.payload.clone()).await {
            Ok(()) => {
                let commit = engine::confirm(&mut self.ledger, pending);
                tracing::info!(
                    row = commit.position.row(),
                    col = commit.position.col(),
                    kind = %commit.result,
                    "transaction committed"
                );
                Ok(commit)
            }
            Err(e) => {
                engine::rollback(&mut self.grid, &mut self.ledger, pending);
                Err(e.into())
            }
        }
    }

    pub fn details(&self, position: Position) -> Option<BuildingDetails> {
        self.grid.get(position).map(|kind| BuildingDetails {
            position,
            kind,
            icon: kind.icon(),
            category: kind.category(),
            level: kind.level(),
            invested: kind.invested(),
        })
    }

    pub fn snapshot(&self) -> CitySnapshot {
        let view = self.view();
        CitySnapshot {
            grid: view.icons(),
            selection: self.grid.selection(),
            resources: self.ledger.resources(),
            filter: self.filter,
            chosen: self.chosen,
            buildings: self.grid.occupied(),
            session: self.session.as_ref().map(|session| SessionView {
                user_id: session.user_id.clone(),
                email: session.email.clone(),
                role: session.role,
                buildings_loaded: session.buildings_loaded,
            }),
        }
    }
}

impl Default for City {
    fn default() -> Self {
        Self::new(ledger::STARTING_RESOURCES)
    }
}
