use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::actor::{CityHandle, Notification};
use crate::api::model::{ApiError, ApiRequest, ApiResponse, Call};
use crate::city::{CityError, Resources};
use crate::persistence::BuildingStore;
use crate::session::auth::Authenticator;

const OUTBOX_SIZE: usize = 100;

/// Serves one client: every connection gets its own city, torn down when the
/// socket closes.
pub async fn accept_connection<S, A>(
    stream: TcpStream,
    store: Arc<S>,
    auth: Arc<A>,
    starting: Resources,
) where
    S: BuildingStore,
    A: Authenticator,
{
    let connection = Uuid::new_v4();
    let addr = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    };

    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("WebSocket handshake failed for address {}: {}", addr, e);
            return;
        }
    };
    tracing::debug!(%connection, %addr, "accepted connection");

    let (notify_tx, mut notify_rx) = mpsc::channel::<Notification>(OUTBOX_SIZE);
    let (city, city_task) = CityHandle::spawn(store, auth, starting, Some(notify_tx));

    let (mut write, mut read) = ws_stream.split();
    let (response_tx, mut response_rx) = mpsc::channel::<ApiResponse>(OUTBOX_SIZE);

    let writer = tokio::spawn(async move {
        while let Some(response) = response_rx.recv().await {
            let text = match response.as_text() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(%connection, "failed to encode response: {}", e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(text.into())).await {
                tracing::error!(%connection, "failed to send response: {}", e);
                break;
            }
        }
    });

    let updates_tx = response_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(notification) = notify_rx.recv().await {
            let response = match notification {
                Notification::SessionUpdated(snapshot) => ApiResponse::Update { snapshot },
                Notification::LoadFailed(e) => ApiResponse::Error {
                    id: None,
                    error: ApiError::from(&e),
                },
            };
            if updates_tx.send(response).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = read.next().await {
        let msg = match message {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!(%connection, "error reading message: {}", e);
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        let response = match ApiRequest::from_text(text) {
            Ok(request) => dispatch(&city, request).await,
            Err(e) => {
                tracing::warn!(%connection, "failed to parse message: {}", e);
                ApiResponse::error(None, "bad_request", e.to_string())
            }
        };
        if response_tx.send(response).await.is_err() {
            break;
        }
    }

    city.stop().await;
    if let Err(e) = city_task.await {
        tracing::warn!(%connection, "city task ended with error: {:?}", e);
    }
    forwarder.abort();
    drop(response_tx);
    let _ = writer.await;
    tracing::debug!(%connection, "connection closed");
}

pub async fn dispatch(city: &CityHandle, request: ApiRequest) -> ApiResponse {
    let call = match request.call() {
        Ok(call) => call,
        Err(e) => return ApiResponse::error(Some(request.id), "bad_request", e.to_string()),
    };
    tracing::debug!(id = %request.id, method = %request.method, "dispatching request");

    let id = request.id;
    let result = match call {
        Call::Login(params) => city.login(&params.email, &params.password).await,
        Call::Signup { params, role } => {
            city.signup(&params.email, &params.password, &params.confirm, role)
                .await
        }
        Call::Logout => city.logout().await,
        Call::Select(cell) => city.select(cell.row, cell.col).await,
        Call::ClearSelection => city.clear_selection().await,
        Call::Choose(kind) => city.choose(kind).await,
        Call::Filter(filter) => city.set_filter(filter).await,
        Call::TopUp(params) => city.top_up(params.amounts()).await,
        Call::Snapshot => city.snapshot().await,
        Call::Build => {
            return match city.build_or_upgrade().await {
                Ok((commit, snapshot)) => ApiResponse::Committed {
                    id,
                    commit,
                    snapshot,
                },
                Err(e) => failure(id, &e),
            };
        }
        Call::Details(cell) => {
            return match city.details(cell.row, cell.col).await {
                Ok(details) => ApiResponse::Details { id, details },
                Err(e) => failure(id, &e),
            };
        }
    };

    match result {
        Ok(snapshot) => ApiResponse::Snapshot { id, snapshot },
        Err(e) => failure(id, &e),
    }
}

fn failure(id: String, e: &CityError) -> ApiResponse {
    tracing::debug!(%id, kind = e.kind(), "request failed: {}", e);
    ApiResponse::Error {
        id: Some(id),
        error: ApiError::from(e),
    }
}
