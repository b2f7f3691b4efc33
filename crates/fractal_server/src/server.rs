use crate::ServerConfig;
use crate::auth::{self, AuthState, Session, Sessions};
use crate::engine::EngineHandle;
use crate::generate::{LlmClient, generate_ui, method_not_allowed};
use axum::{
    Extension, Json, Router,
    extract::{FromRef, ws::WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use fractal_api::{PROTOCOL_VERSION, ServerEvent, WsClientMessage, WsServerMessage};
use fractal_backend::SqliteStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Builds the app router. The returned `Sessions` lets the caller stop every
/// session engine when the server goes away.
pub(crate) fn router(config: ServerConfig) -> anyhow::Result<(Router, Sessions)> {
    let store = Arc::new(SqliteStore::new(config.db_path.clone())?);
    let llm = LlmClient::new(config.llm.clone());
    let sessions = Sessions::default();

    let state = AppStateHolder {
        auth: AuthState::new(store, Arc::new(llm.clone()), sessions.clone()),
        llm,
    };

    let protected = Router::new()
        .route("/app", get(get_app))
        .route(
            "/generate-ui",
            post(generate_ui).fallback(method_not_allowed),
        )
        .route("/events", get(ws_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router())
        .merge(protected)
        .with_state(state);

    let web_index = config.web_dist_dir.join("index.html");
    let web = ServeDir::new(&config.web_dist_dir).not_found_service(ServeFile::new(web_index));

    let app = Router::new()
        .nest("/api", api)
        .fallback_service(web)
        .layer(TraceLayer::new_for_http());
    Ok((app, sessions))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Clone, FromRef)]
pub(crate) struct AppStateHolder {
    auth: AuthState,
    llm: LlmClient,
}

async fn get_app(Extension(session): Extension<Session>) -> impl IntoResponse {
    match session.engine.app_snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
        )
            .into_response(),
    }
}

async fn ws_events(
    ws: WebSocketUpgrade,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_events_task(socket, session))
}

async fn ws_events_task(mut socket: axum::extract::ws::WebSocket, session: Session) {
    let mut rx = session.events.subscribe();
    let engine = session.engine.clone();

    let current_rev = engine.current_rev().await.unwrap_or(0);
    let _ = socket
        .send(json_text(&WsServerMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            current_rev,
        }))
        .await;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(Ok(msg)) = incoming else { break };
                if handle_ws_incoming(msg, &engine, &mut socket).await.is_err() {
                    break;
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(outgoing) => {
                        if socket.send(json_text(&outgoing)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "ws client lagged behind app events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

fn json_text<T: serde::Serialize>(value: &T) -> axum::extract::ws::Message {
    axum::extract::ws::Message::Text(serde_json::to_string(value).unwrap_or_default().into())
}

async fn handle_ws_incoming(
    msg: axum::extract::ws::Message,
    engine: &EngineHandle,
    socket: &mut axum::extract::ws::WebSocket,
) -> anyhow::Result<()> {
    let axum::extract::ws::Message::Text(text) = msg else {
        return Ok(());
    };

    let client: WsClientMessage = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(err) => {
            let _ = socket
                .send(json_text(&WsServerMessage::Error {
                    request_id: None,
                    message: format!("invalid ws message: {err}"),
                }))
                .await;
            return Ok(());
        }
    };

    match client {
        WsClientMessage::Hello { .. } => {
            // Resync: the client may have missed events before connecting.
            if let Ok(snapshot) = engine.app_snapshot().await {
                let rev = snapshot.rev;
                socket
                    .send(json_text(&WsServerMessage::Event {
                        rev,
                        event: Box::new(ServerEvent::AppChanged {
                            rev,
                            snapshot: Box::new(snapshot),
                        }),
                    }))
                    .await?;
            }
            Ok(())
        }
        WsClientMessage::Ping => {
            socket.send(json_text(&WsServerMessage::Pong)).await?;
            Ok(())
        }
        WsClientMessage::Action { request_id, action } => {
            let msg = match engine.apply_client_action(*action).await {
                Ok(rev) => WsServerMessage::Ack { request_id, rev },
                Err(message) => WsServerMessage::Error {
                    request_id: Some(request_id),
                    message,
                },
            };
            socket.send(json_text(&msg)).await?;
            Ok(())
        }
    }
}
