#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use edu_portal::{
    AppConfig, AppState, LocalPlatformApi, MemorySessionStore, MockStorageService, create_router,
    auth::{SESSION_COOKIE, issue_session_token},
    models::{Role, User},
    session::{Session, SessionId, SessionStore, SessionStoreState},
    storage::StorageState,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse";

/// A router wired to in-memory backends, plus handles on those backends so a
/// test can seed data and inspect sessions.
pub struct TestApp {
    pub router: Router,
    pub api: Arc<LocalPlatformApi>,
    pub sessions: Arc<MemorySessionStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, Arc::new(LocalPlatformApi::new()), MockStorageService::new())
    }

    pub fn build(config: AppConfig, api: Arc<LocalPlatformApi>, storage: MockStorageService) -> Self {
        let sessions = Arc::new(MemorySessionStore::new());
        let state = AppState {
            sessions: sessions.clone() as SessionStoreState,
            api: api.clone(),
            storage: Arc::new(storage) as StorageState,
            config: config.clone(),
        };
        Self {
            router: create_router(state),
            api,
            sessions,
            config,
        }
    }

    /// Registers `user` with the platform and opens a session for them.
    /// Returns the `Cookie` header value for that session.
    pub async fn sign_in(&self, user: &User) -> (SessionId, String) {
        let token = self.api.register(user.clone(), PASSWORD).await;
        let sid = Uuid::new_v4();
        let session = Session::new(user.clone(), token, self.config.session_ttl_secs);
        self.sessions.save_session(sid, &session).await.unwrap();
        (sid, self.cookie(sid))
    }

    pub fn cookie(&self, sid: SessionId) -> String {
        let token = issue_session_token(&self.config, sid).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }
}

pub fn user(role: Role, complete: bool) -> User {
    let id = Uuid::new_v4();
    User {
        id,
        name: format!("{} {}", role.as_str(), &id.simple().to_string()[..6]),
        email: format!("{}@example.com", id.simple()),
        role,
        is_profile_complete: complete,
        ..Default::default()
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request("GET", uri, cookie, None)
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

/// The `name=value` part of the response's session `Set-Cookie`, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(SESSION_COOKIE))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
