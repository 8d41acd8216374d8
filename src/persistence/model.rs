use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blueprint::BuildingKind;
use crate::city::grid::Position;
use crate::persistence::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPosition {
    pub row: i64,
    pub col: i64,
}

/// One entry of `GET /buildings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRecord {
    pub id: String,
    pub user_id: String,
    pub position: RecordPosition,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_upgraded: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_icon: Option<String>,
}

impl BuildingRecord {
    /// The icon to show for this record: the upgraded icon when the record
    /// is an upgrade that names one, otherwise the base type.
    pub fn icon(&self) -> &str {
        match (&self.upgraded_icon, self.is_upgraded) {
            (Some(icon), true) => icon,
            _ => &self.kind,
        }
    }

    pub fn placement(&self) -> Result<(Position, BuildingKind), PersistenceError> {
        let invalid = |reason: String| PersistenceError::InvalidRecord(format!("{}: {}", self.id, reason));

        let kind = BuildingKind::from_icon(self.icon())
            .ok_or_else(|| invalid(format!("unknown icon {:?}", self.icon())))?;
        let row = usize::try_from(self.position.row);
        let col = usize::try_from(self.position.col);
        let position = match (row, col) {
            (Ok(row), Ok(col)) => Position::new(row, col).ok(),
            _ => None,
        }
        .ok_or_else(|| {
            invalid(format!(
                "position ({}, {}) is off the grid",
                self.position.row, self.position.col
            ))
        })?;

        Ok((position, kind))
    }
}

/// Body of `POST /buildings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBuildingPayload {
    pub user_id: String,
    pub row: usize,
    pub col: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_upgraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_icon: Option<String>,
}

impl SaveBuildingPayload {
    /// `type` is always the base icon; upgrades also name the resulting icon.
    pub fn new(user_id: &str, position: Position, result: BuildingKind) -> Self {
        let is_upgraded = result.is_upgraded();
        Self {
            user_id: user_id.to_string(),
            row: position.row(),
            col: position.col(),
            kind: result.base().icon().to_string(),
            is_upgraded,
            upgraded_icon: is_upgraded.then(|| result.icon().to_string()),
        }
    }
}

/// Placements belonging to `user_id`, oldest first. Any malformed record
/// fails the whole batch.
pub fn placements_for(
    records: &[BuildingRecord],
    user_id: &str,
) -> Result<Vec<(Position, BuildingKind)>, PersistenceError> {
    let mut owned: Vec<&BuildingRecord> = records.iter().filter(|r| r.user_id == user_id).collect();
    owned.sort_by_key(|r| r.created_at);
    owned.into_iter().map(BuildingRecord::placement).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, user: &str, row: i64, col: i64, kind: &str, upgraded: Option<&str>, at: &str) -> BuildingRecord {
        BuildingRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            position: RecordPosition { row, col },
            kind: kind.to_string(),
            is_upgraded: upgraded.is_some(),
            created_at: at.parse().unwrap(),
            upgraded_icon: upgraded.map(str::to_string),
        }
    }

    #[test]
    fn test_record_wire_format() {
        let json = r#"{
            "id": "b1",
            "userId": "u1",
            "position": {"row": 2, "col": 3},
            "type": "🏭",
            "isUpgraded": true,
            "createdAt": "2024-05-01T10:00:00.000Z",
            "upgradedIcon": "🏢"
        }"#;
        let parsed: BuildingRecord = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.kind, "🏭");
        assert_eq!(parsed.icon(), "🏢");
        let (position, kind) = parsed.placement().unwrap();
        assert_eq!((position.row(), position.col()), (2, 3));
        assert_eq!(kind, BuildingKind::Office);
    }

    #[test]
    fn test_null_upgraded_icon_falls_back_to_type() {
        let json = r#"{"id":"b2","userId":"u1","position":{"row":0,"col":0},"type":"🏠",
            "isUpgraded":true,"createdAt":"2024-05-01T10:00:00Z","upgradedIcon":null}"#;
        let parsed: BuildingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.placement().unwrap().1, BuildingKind::House);
    }

    #[test]
    fn test_payload_for_build_and_upgrade() {
        let position = Position::new(0, 0).unwrap();

        let build = SaveBuildingPayload::new("u1", position, BuildingKind::House);
        assert_eq!(
            serde_json::to_value(&build).unwrap(),
            serde_json::json!({"userId": "u1", "row": 0, "col": 0, "type": "🏠", "isUpgraded": false})
        );

        let upgrade = SaveBuildingPayload::new("u1", position, BuildingKind::Neighborhood);
        assert_eq!(upgrade.kind, "🏠");
        assert!(upgrade.is_upgraded);
        assert_eq!(upgrade.upgraded_icon.as_deref(), Some("🏘️"));
    }

    #[test]
    fn test_placements_filter_by_user_and_order() {
        let records = vec![
            record("3", "u1", 1, 1, "🏠", Some("🏘️"), "2024-05-02T00:00:00Z"),
            record("1", "u1", 1, 1, "🏠", None, "2024-05-01T00:00:00Z"),
            record("2", "u2", 5, 5, "🏭", None, "2024-05-01T12:00:00Z"),
        ];
        let placements = placements_for(&records, "u1").unwrap();

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].1, BuildingKind::House);
        assert_eq!(placements[1].1, BuildingKind::Neighborhood);
    }

    #[test]
    fn test_bad_record_fails_batch() {
        let records = vec![
            record("1", "u1", 0, 0, "🏠", None, "2024-05-01T00:00:00Z"),
            record("2", "u1", 10, 0, "🏠", None, "2024-05-01T00:00:01Z"),
        ];
        assert!(matches!(
            placements_for(&records, "u1"),
            Err(PersistenceError::InvalidRecord(_))
        ));

        let unknown = vec![record("3", "u1", 0, 0, "🚀", None, "2024-05-01T00:00:00Z")];
        assert!(placements_for(&unknown, "u1").is_err());

        let negative = vec![record("4", "u1", -1, 0, "🏠", None, "2024-05-01T00:00:00Z")];
        assert!(placements_for(&negative, "u1").is_err());
    }
}
