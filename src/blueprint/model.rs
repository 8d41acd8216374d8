use serde::{Deserialize, Serialize};

/// Every kind of structure that can occupy a cell. Base kinds are buildable,
/// the others only appear as the result of an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    House,
    Neighborhood,
    Road,
    Railway,
    Factory,
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Residential,
    Commercial,
    Industrial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cost {
    pub budget: u64,
    pub materials: u64,
    pub workers: u64,
}

impl Cost {
    pub const fn new(budget: u64, materials: u64, workers: u64) -> Self {
        Self {
            budget,
            materials,
            workers,
        }
    }
}

impl std::ops::Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost {
            budget: self.budget + rhs.budget,
            materials: self.materials + rhs.materials,
            workers: self.workers + rhs.workers,
        }
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "budget {}, materials {}, workers {}",
            self.budget, self.materials, self.workers
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upgrade {
    pub cost: Cost,
    pub result: BuildingKind,
}
