pub mod catalog;
pub mod model;

pub use model::{BuildingKind, Category, Cost, Upgrade};
