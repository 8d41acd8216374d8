//! Build/upgrade transactions.
//!
//! A transaction is applied in two phases. [`attempt`] validates the request
//! and applies it locally: the cell is written and the cost is held under a
//! ledger receipt. Once the store has acknowledged the new record the caller
//! either [`confirm`]s the transaction or [`rollback`]s it, which restores
//! the cell, the selection and the reserved resources.

use serde::Serialize;

use crate::blueprint::{BuildingKind, Cost};
use crate::city::error::CityError;
use crate::city::grid::{Cell, Grid, Position};
use crate::city::ledger::{Ledger, Receipt};
use crate::city::permission::{Action, can_perform};
use crate::persistence::SaveBuildingPayload;
use crate::session::{RoleState, SessionContext};

/// A transaction applied locally but not yet acknowledged by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub position: Position,
    pub action: Action,
    pub previous: Cell,
    pub result: BuildingKind,
    pub receipt: Receipt,
    pub payload: SaveBuildingPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub position: Position,
    pub action: Action,
    pub result: BuildingKind,
    pub cost: Cost,
}

/// Validates and locally applies one build or upgrade at `position`.
///
/// An empty cell is built with `chosen`; an occupied cell is upgraded
/// according to its own upgrade rule and `chosen` is ignored. On error the
/// grid and the ledger are left untouched.
pub fn attempt(
    grid: &mut Grid,
    ledger: &mut Ledger,
    position: Option<Position>,
    chosen: BuildingKind,
    session: Option<&SessionContext>,
) -> Result<PendingCommit, CityError> {
    let position = position.ok_or(CityError::NoSelection)?;
    let session = session.ok_or(CityError::Unauthenticated)?;
    let role = match session.role {
        RoleState::Pending => return Err(CityError::RoleUndetermined),
        RoleState::Resolved(role) => role,
    };
    if !session.buildings_loaded {
        return Err(CityError::BuildingsLoading);
    }

    let previous = grid.get(position);
    let (action, cost, result) = match previous {
        None => {
            let cost = chosen.build_cost().ok_or(CityError::NotBuildable(chosen))?;
            (Action::Build, cost, chosen)
        }
        Some(current) => {
            let upgrade = current.upgrade().ok_or(CityError::NotUpgradable(current))?;
            (Action::Upgrade, upgrade.cost, upgrade.result)
        }
    };

    if !can_perform(action, Some(role)) {
        return Err(CityError::PermissionDenied { action, role });
    }

    let receipt = ledger.reserve(cost)?;
    grid.set(position, Some(result));
    grid.clear_selection();

    tracing::debug!(
        user_id = %session.user_id,
        row = position.row(),
        col = position.col(),
        %action,
        kind = %result,
        "transaction applied locally"
    );

    Ok(PendingCommit {
        position,
        action,
        previous,
        result,
        receipt,
        payload: SaveBuildingPayload::new(&session.user_id, position, result),
    })
}

pub fn confirm(ledger: &mut Ledger, pending: PendingCommit) -> Commit {
    ledger.settle(pending.receipt.id);
    Commit {
        position: pending.position,
        action: pending.action,
        result: pending.result,
        cost: pending.receipt.cost,
    }
}

pub fn rollback(grid: &mut Grid, ledger: &mut Ledger, pending: PendingCommit) {
    grid.set(pending.position, pending.previous);
    grid.select(pending.position);
    ledger.release(pending.receipt.id);
    tracing::warn!(
        row = pending.position.row(),
        col = pending.position.col(),
        "transaction rolled back"
    );
}
