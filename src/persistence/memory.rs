use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::persistence::{
    BuildingRecord, BuildingStore, PersistenceError, RecordPosition, SaveBuildingPayload,
};

/// Building list kept in process memory, used when no backend is configured.
#[derive(Debug, Default)]
pub struct MemoryBuildingStore {
    records: Mutex<Vec<BuildingRecord>>,
}

impl MemoryBuildingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<BuildingRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn records(&self) -> Vec<BuildingRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl BuildingStore for MemoryBuildingStore {
    async fn list(&self) -> Result<Vec<BuildingRecord>, PersistenceError> {
        Ok(self.records())
    }

    async fn insert(&self, payload: SaveBuildingPayload) -> Result<(), PersistenceError> {
        let record = BuildingRecord {
            id: Uuid::new_v4().to_string(),
            user_id: payload.user_id,
            position: RecordPosition {
                row: payload.row as i64,
                col: payload.col as i64,
            },
            kind: payload.kind,
            is_upgraded: payload.is_upgraded,
            created_at: Utc::now(),
            upgraded_icon: payload.upgraded_icon,
        };
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_appends_record() {
        let store = MemoryBuildingStore::new();
        store
            .insert(SaveBuildingPayload {
                user_id: "u1".to_string(),
                row: 1,
                col: 2,
                kind: "🏠".to_string(),
                is_upgraded: true,
                upgraded_icon: Some("🏘️".to_string()),
            })
            .await
            .unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, RecordPosition { row: 1, col: 2 });
        assert_eq!(records[0].icon(), "🏘️");
    }
}
