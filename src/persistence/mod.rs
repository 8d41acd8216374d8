pub mod http;
pub mod memory;
pub mod model;

use std::future::Future;

pub use http::HttpBuildingStore;
pub use memory::MemoryBuildingStore;
pub use model::{BuildingRecord, RecordPosition, SaveBuildingPayload};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to fetch buildings: {0}")]
    Fetch(String),
    #[error("failed to save building: {0}")]
    Save(String),
    #[error("invalid building record: {0}")]
    InvalidRecord(String),
}

/// The remote building list: read in full at session start, appended to on
/// every committed build or upgrade.
pub trait BuildingStore: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = Result<Vec<BuildingRecord>, PersistenceError>> + Send;

    fn insert(
        &self,
        payload: SaveBuildingPayload,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}
