use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blueprint::Cost;
use crate::city::error::CityError;

pub const STARTING_RESOURCES: Resources = Resources {
    budget: 10_000,
    materials: 1_000,
    workers: 20,
};

pub type Resources = Cost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Budget,
    Materials,
    Workers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Budget,
        ResourceKind::Materials,
        ResourceKind::Workers,
    ];
}

/// Cost held back by a phase-one commit until it is settled or released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: Uuid,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    resources: Resources,
    reserved: HashMap<Uuid, Receipt>,
}

impl Ledger {
    pub fn new(resources: Resources) -> Self {
        Self {
            resources,
            reserved: HashMap::new(),
        }
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn credit(&mut self, kind: ResourceKind, amount: i64) -> Result<Resources, CityError> {
        if amount <= 0 {
            return Err(CityError::Validation(amount));
        }
        let amount = amount as u64;
        let counter = match kind {
            ResourceKind::Budget => &mut self.resources.budget,
            ResourceKind::Materials => &mut self.resources.materials,
            ResourceKind::Workers => &mut self.resources.workers,
        };
        *counter = counter.saturating_add(amount);
        tracing::debug!(?kind, amount, "resources credited");
        Ok(self.resources)
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.resources.budget >= cost.budget
            && self.resources.materials >= cost.materials
            && self.resources.workers >= cost.workers
    }

    /// Deducts `cost` and holds it under a receipt. Only the engine calls this,
    /// after its own validation.
    pub(crate) fn reserve(&mut self, cost: Cost) -> Result<Receipt, CityError> {
        if !self.can_afford(&cost) {
            return Err(CityError::InsufficientResources {
                required: cost,
                available: self.resources,
            });
        }

        self.resources.budget -= cost.budget;
        self.resources.materials -= cost.materials;
        self.resources.workers -= cost.workers;

        let receipt = Receipt {
            id: Uuid::new_v4(),
            cost,
        };
        self.reserved.insert(receipt.id, receipt.clone());
        tracing::debug!(receipt = %receipt.id, %cost, "resources reserved");
        Ok(receipt)
    }

    /// Makes a reservation permanent.
    pub(crate) fn settle(&mut self, id: Uuid) -> bool {
        self.reserved.remove(&id).is_some()
    }

    /// Returns a reservation's cost to the pool.
    pub(crate) fn release(&mut self, id: Uuid) -> bool {
        match self.reserved.remove(&id) {
            Some(receipt) => {
                self.resources = self.resources + receipt.cost;
                tracing::debug!(receipt = %id, "reservation released");
                true
            }
            None => {
                tracing::warn!(receipt = %id, "no reservation found to release");
                false
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.reserved.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(STARTING_RESOURCES)
    }
}
