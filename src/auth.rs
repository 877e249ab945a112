use std::{
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    access::AuthState,
    config::{AppConfig, Env},
    error::SessionError,
    models::User,
    session::{Session, SessionId, SessionStoreState},
};

pub const SESSION_COOKIE: &str = "edu_session";
/// Development-only header carrying a raw session id (honoured in `Env::Local`).
pub const SESSION_HEADER: &str = "x-session-id";

/// SessionClaims
///
/// Payload of the signed session cookie. The cookie only names the session;
/// the identity itself always comes from the session store.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub iat: usize,
    pub exp: usize,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Signs a session cookie value for `sid`, valid for the configured session TTL.
pub fn issue_session_token(
    config: &AppConfig,
    sid: SessionId,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = now_secs();
    let claims = SessionClaims {
        sid,
        iat: now as usize,
        exp: now.saturating_add(config.session_ttl_secs) as usize,
    };
    let key = EncodingKey::from_secret(config.session_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// Verifies a session cookie value. Any failure (bad signature, expiry,
/// malformed token) means "no session".
pub fn decode_session_token(config: &AppConfig, token: &str) -> Option<SessionId> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<SessionClaims>(token, &key, &validation) {
        Ok(data) => Some(data.claims.sid),
        Err(e) => {
            tracing::debug!(error = %e, "rejected session cookie");
            None
        }
    }
}

/// `Set-Cookie` value installing the session cookie.
pub fn session_cookie(config: &AppConfig, token: &str) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_ttl_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie(config: &AppConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Resolves the session id presented by a request: the signed cookie first,
/// then (local only) the raw development header.
pub fn session_id_from_headers(config: &AppConfig, headers: &HeaderMap) -> Option<SessionId> {
    if let Some(sid) = read_cookie(headers, SESSION_COOKIE)
        .and_then(|token| decode_session_token(config, token))
    {
        return Some(sid);
    }

    if config.env == Env::Local {
        return headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok());
    }
    None
}

/// AuthContext
///
/// The authentication state of one request. It is created in `Loading`,
/// restored from the session store exactly once, and then `Ready`. All writes
/// to the session go through `login`, `logout`, `update_user` and the
/// impersonation transitions, which keep the in-memory state and the store in step.
#[derive(Clone)]
pub struct AuthContext {
    store: SessionStoreState,
    ttl_secs: u64,
    sid: Option<SessionId>,
    session: Option<Session>,
    state: AuthState,
}

impl AuthContext {
    pub fn new(store: SessionStoreState, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl_secs,
            sid: None,
            session: None,
            state: AuthState::Loading,
        }
    }

    /// Convenience for `new` followed by `init`.
    pub async fn restore(store: SessionStoreState, ttl_secs: u64, sid: Option<SessionId>) -> Self {
        let mut ctx = Self::new(store, ttl_secs);
        ctx.init(sid).await;
        ctx
    }

    /// init
    ///
    /// Loads the session named by `sid`. A storage failure is logged and
    /// degrades to an anonymous context; either way the context ends `Ready`.
    pub async fn init(&mut self, sid: Option<SessionId>) {
        self.sid = sid;
        self.session = match sid {
            Some(sid) => match self.store.get_session(sid).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, %sid, "session restore failed, continuing signed out");
                    None
                }
            },
            None => None,
        };
        self.state = AuthState::Ready(self.session.as_ref().map(|s| s.user.clone()));
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.sid
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_impersonating(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_impersonating)
    }

    fn apply(&mut self, sid: SessionId, session: Option<Session>) {
        self.sid = Some(sid);
        self.state = AuthState::Ready(session.as_ref().map(|s| s.user.clone()));
        self.session = session;
    }

    /// login
    ///
    /// Starts a fresh session for `user` under a newly minted id and drops the
    /// previous one, if any. Returns the id the caller must put in the cookie.
    /// On failure the context is left signed out.
    pub async fn login(&mut self, user: User, token: String) -> Result<SessionId, SessionError> {
        if let Some(old) = self.sid.take() {
            if let Err(e) = self.store.logout(old).await {
                tracing::warn!(error = %e, sid = %old, "could not drop previous session");
            }
        }
        self.session = None;
        self.state = AuthState::Ready(None);

        match self.store.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "expired sessions removed"),
            Err(e) => tracing::warn!(error = %e, "could not purge expired sessions"),
        }

        let sid = Uuid::new_v4();
        let session = Session::new(user, token, self.ttl_secs);
        self.store.save_session(sid, &session).await?;
        tracing::info!(%sid, user_id = %session.user.id, role = session.user.role.as_str(), "signed in");
        self.apply(sid, Some(session));
        Ok(sid)
    }

    /// logout
    ///
    /// Clears the stored session and the in-memory state. Signing out an
    /// anonymous context is a no-op.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(sid) = self.sid.take() {
            self.store.logout(sid).await?;
            tracing::info!(%sid, "signed out");
        }
        self.session = None;
        self.state = AuthState::Ready(None);
        Ok(())
    }

    /// Replaces the signed-in user's record (e.g. after onboarding) while
    /// keeping the token and any impersonation marker.
    pub async fn update_user(&mut self, user: User) -> Result<(), SessionError> {
        let (sid, mut session) = match (self.sid, self.session.clone()) {
            (Some(sid), Some(session)) => (sid, session),
            _ => return Err(SessionError::NoSession),
        };
        session.user = user;
        self.store.save_session(sid, &session).await?;
        self.apply(sid, Some(session));
        Ok(())
    }

    pub async fn start_impersonation(
        &mut self,
        target: User,
        token: String,
    ) -> Result<(), SessionError> {
        let sid = self.sid.ok_or(SessionError::NoSession)?;
        let session = self.store.start_impersonation(sid, target, token).await?;
        tracing::info!(
            %sid,
            target = %session.user.id,
            admin = ?session.impersonator.as_ref().map(|i| i.user.id),
            "impersonation started"
        );
        self.apply(sid, Some(session));
        Ok(())
    }

    /// exit_impersonation
    ///
    /// Puts the original admin identity back on the session and returns it.
    pub async fn exit_impersonation(&mut self) -> Result<User, SessionError> {
        let sid = self.sid.ok_or(SessionError::NoSession)?;
        let session = self.store.exit_impersonation(sid).await?;
        let admin = session.user.clone();
        tracing::info!(%sid, admin = %admin.id, "impersonation ended");
        self.apply(sid, Some(session));
        Ok(admin)
    }
}

/// AuthContext Extractor Implementation
///
/// Restores the context once per request and caches it in the request
/// extensions, so the guards and the handler all observe the same state
/// without hitting the session store again. Never rejects: an unusable cookie
/// simply yields an anonymous context.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    SessionStoreState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }

        let config = AppConfig::from_ref(state);
        let store = SessionStoreState::from_ref(state);
        let sid = session_id_from_headers(&config, &parts.headers);

        let ctx = AuthContext::restore(store, config.session_ttl_secs, sid).await;
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

/// CurrentUser
///
/// The signed-in identity and its platform API token. Rejects with 401 when
/// the request carries no live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SessionStoreState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(ctx) = AuthContext::from_request_parts(parts, state).await;
        match ctx.session() {
            Some(session) => Ok(CurrentUser {
                user: session.user.clone(),
                token: session.token.clone(),
            }),
            None => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

/// SuperAdmin
///
/// Like `CurrentUser`, but additionally requires the `super_admin` role (403 otherwise).
#[derive(Debug, Clone)]
pub struct SuperAdmin {
    pub user: User,
    pub token: String,
}

impl<S> FromRequestParts<S> for SuperAdmin
where
    S: Send + Sync,
    SessionStoreState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, token } = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_super_admin() {
            tracing::warn!(user_id = %user.id, role = user.role.as_str(), "admin route refused");
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(SuperAdmin { user, token })
    }
}
