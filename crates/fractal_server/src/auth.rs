use crate::engine::{Engine, EngineHandle};
use crate::generate::error_response;
use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use fractal_api::{AuthRequest, AuthResponse, WsServerMessage};
use fractal_backend::{Account, SqliteStore, normalize_email};
use fractal_domain::{CodeGenerator, Identity};
use rand::{RngCore as _, rngs::OsRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

static SESSION_COOKIE_NAME: &str = "fractal_session";
const MIN_PASSWORD_CHARS: usize = 6;

/// A signed-in browser and the engine holding that user's app state.
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) engine: EngineHandle,
    pub(crate) events: broadcast::Sender<WsServerMessage>,
}

/// Session token to session. Each session owns one engine task.
#[derive(Clone, Default)]
pub(crate) struct Sessions {
    inner: Arc<Mutex<HashMap<String, Session>>>,
}

impl Sessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, token: &str) -> Option<Session> {
        self.lock().get(token).cloned()
    }

    fn insert(&self, token: String, session: Session) {
        self.lock().insert(token, session);
    }

    fn revoke(&self, token: &str) {
        let removed = self.lock().remove(token);
        if let Some(session) = removed {
            session.engine.shutdown();
        }
    }

    pub(crate) fn shutdown_all(&self) {
        let drained = self.lock().drain().map(|(_, s)| s).collect::<Vec<_>>();
        for session in drained {
            session.engine.shutdown();
        }
    }
}

#[derive(Clone)]
pub(crate) struct AuthState {
    store: Arc<SqliteStore>,
    generator: Arc<dyn CodeGenerator>,
    sessions: Sessions,
}

impl AuthState {
    pub(crate) fn new(
        store: Arc<SqliteStore>,
        generator: Arc<dyn CodeGenerator>,
        sessions: Sessions,
    ) -> Self {
        Self {
            store,
            generator,
            sessions,
        }
    }

    fn session(&self, headers: &HeaderMap) -> Option<Session> {
        self.sessions.get(session_token(headers)?)
    }

    async fn open_session(&self, account: &Account) -> anyhow::Result<String> {
        let (engine, events) = Engine::start(self.store.clone(), self.generator.clone());
        let identity = Identity {
            owner_id: account.owner_id.clone(),
            email: Some(account.email.clone()),
        };
        if let Err(err) = engine.set_identity(Some(identity)).await {
            engine.shutdown();
            return Err(err);
        }

        let token = new_session_token();
        self.sessions
            .insert(token.clone(), Session { engine, events });
        tracing::info!(owner_id = %account.owner_id, "session opened");
        Ok(token)
    }

    async fn signed_in(&self, account: Account, status: StatusCode) -> Response {
        let token = match self.open_session(&account).await {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(error = %err, "failed to open session");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to sign in");
            }
        };

        let cookie = format!(
            "{name}={token}; Path=/; HttpOnly; SameSite=Lax",
            name = SESSION_COOKIE_NAME,
        );
        let body = AuthResponse {
            owner_id: fractal_api::OwnerId(account.owner_id.as_str().to_owned()),
            email: account.email,
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            resp.headers_mut().append(SET_COOKIE, value);
        }
        resp
    }
}

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    let cookie = headers.get(COOKIE).and_then(|h| h.to_str().ok())?;
    cookie_value(cookie, SESSION_COOKIE_NAME).filter(|token| !token.is_empty())
}

fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    for part in cookie_header.split(';') {
        let trimmed = part.trim();
        let Some((k, v)) = trimmed.split_once('=') else {
            continue;
        };
        if k.trim() == name {
            return Some(v.trim());
        }
    }
    None
}

/// Rejects requests without a live session and hands the session to the
/// handler through request extensions.
pub(crate) async fn require_session(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session) = auth.session(req.headers()) else {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    };
    req.extensions_mut().insert(session);
    next.run(req).await
}

fn validate_credentials(req: &AuthRequest) -> Result<String, &'static str> {
    let email = normalize_email(&req.email);
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_email {
        return Err("A valid email is required");
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err("Password must be at least 6 characters");
    }
    Ok(email)
}

async fn signup(State(auth): State<AuthState>, Json(req): Json<AuthRequest>) -> Response {
    let email = match validate_credentials(&req) {
        Ok(email) => email,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let store = auth.store.clone();
    let created =
        tokio::task::spawn_blocking(move || store.create_account(&email, &req.password)).await;
    match created {
        Ok(Ok(Some(account))) => auth.signed_in(account, StatusCode::CREATED).await,
        Ok(Ok(None)) => error_response(
            StatusCode::CONFLICT,
            "An account with this email already exists",
        ),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "signup failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account")
        }
        Err(err) => {
            tracing::error!(error = %err, "signup task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account")
        }
    }
}

async fn login(State(auth): State<AuthState>, Json(req): Json<AuthRequest>) -> Response {
    let store = auth.store.clone();
    let found =
        tokio::task::spawn_blocking(move || store.authenticate(&req.email, &req.password)).await;
    match found {
        Ok(Ok(Some(account))) => auth.signed_in(account, StatusCode::OK).await,
        Ok(Ok(None)) => error_response(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "login failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to sign in")
        }
        Err(err) => {
            tracing::error!(error = %err, "login task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to sign in")
        }
    }
}

async fn logout(State(auth): State<AuthState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        auth.sessions.revoke(token);
    }

    let cookie = format!(
        "{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        name = SESSION_COOKIE_NAME,
    );
    let mut resp = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        resp.headers_mut().append(SET_COOKIE, value);
    }
    resp
}

pub(crate) fn router() -> Router<crate::server::AppStateHolder> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
