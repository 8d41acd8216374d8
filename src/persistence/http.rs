use std::time::Duration;

use reqwest::{Client, Url};

use crate::persistence::{BuildingRecord, BuildingStore, PersistenceError, SaveBuildingPayload};

/// Client for the buildings REST backend.
#[derive(Debug, Clone)]
pub struct HttpBuildingStore {
    client: Client,
    endpoint: Url,
}

impl HttpBuildingStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| PersistenceError::Fetch(format!("invalid base url {base_url}: {e}")))?;
        // keep any path prefix when joining
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("buildings")
            .map_err(|e| PersistenceError::Fetch(e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersistenceError::Fetch(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl BuildingStore for HttpBuildingStore {
    async fn list(&self) -> Result<Vec<BuildingRecord>, PersistenceError> {
        tracing::debug!(url = %self.endpoint, "fetching buildings");
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| PersistenceError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PersistenceError::Fetch(format!(
                "backend responded with {}",
                response.status()
            )));
        }

        response
            .json::<Vec<BuildingRecord>>()
            .await
            .map_err(|e| PersistenceError::Fetch(e.to_string()))
    }

    async fn insert(&self, payload: SaveBuildingPayload) -> Result<(), PersistenceError> {
        tracing::debug!(url = %self.endpoint, user_id = %payload.user_id, row = payload.row, col = payload.col, "saving building");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| PersistenceError::Save(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PersistenceError::Save(format!(
                "backend responded with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    use crate::persistence::RecordPosition;

    type Saved = Arc<Mutex<Vec<SaveBuildingPayload>>>;

    async fn list_buildings() -> Json<serde_json::Value> {
        Json(serde_json::json!([{
            "id": "b1",
            "userId": "u1",
            "position": {"row": 0, "col": 4},
            "type": "🛣️",
            "isUpgraded": false,
            "createdAt": "2024-05-01T10:00:00.000Z"
        }]))
    }

    async fn save_building(
        State(saved): State<Saved>,
        Json(payload): Json<SaveBuildingPayload>,
    ) -> StatusCode {
        saved.lock().unwrap().push(payload);
        StatusCode::CREATED
    }

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_list_and_insert() {
        let saved: Saved = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/buildings", get(list_buildings).post(save_building))
            .with_state(saved.clone());
        let base = spawn_backend(router).await;
        let store = HttpBuildingStore::new(&base, Duration::from_secs(5)).unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, RecordPosition { row: 0, col: 4 });
        assert_eq!(records[0].kind, "🛣️");

        let payload = SaveBuildingPayload {
            user_id: "u1".to_string(),
            row: 3,
            col: 3,
            kind: "🏭".to_string(),
            is_upgraded: false,
            upgraded_icon: None,
        };
        store.insert(payload.clone()).await.unwrap();
        assert_eq!(*saved.lock().unwrap(), vec![payload]);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/buildings",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR })
                .post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = spawn_backend(router).await;
        let store = HttpBuildingStore::new(&base, Duration::from_secs(5)).unwrap();

        assert!(matches!(store.list().await, Err(PersistenceError::Fetch(_))));

        let payload = SaveBuildingPayload {
            user_id: "u1".to_string(),
            row: 0,
            col: 0,
            kind: "🏠".to_string(),
            is_upgraded: false,
            upgraded_icon: None,
        };
        assert!(matches!(
            store.insert(payload).await,
            Err(PersistenceError::Save(_))
        ));
    }

    #[test]
    fn test_endpoint_join() {
        let store = HttpBuildingStore::new("http://localhost:8080", Duration::from_secs(1)).unwrap();
        assert_eq!(store.endpoint().as_str(), "http://localhost:8080/buildings");
        assert!(HttpBuildingStore::new("not a url", Duration::from_secs(1)).is_err());
    }
}
