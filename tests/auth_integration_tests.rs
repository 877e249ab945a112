use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use edu_portal::{
    AppState, LocalPlatformApi, MemorySessionStore, MockStorageService,
    auth::{
        self, AuthContext, CurrentUser, SESSION_COOKIE, SESSION_HEADER, SuperAdmin,
        decode_session_token, issue_session_token,
    },
    config::{AppConfig, Env},
    error::SessionError,
    models::{Role, User},
    session::{Session, SessionStore, SessionStoreState},
};
use std::sync::Arc;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_SESSION_SECRET: &str = "test-session-secret-1234567890";

fn create_app_state(env: Env) -> (AppState, Arc<MemorySessionStore>) {
    let mut config = AppConfig::default();
    config.env = env;
    config.session_secret = TEST_SESSION_SECRET.to_string();

    let sessions = Arc::new(MemorySessionStore::new());
    let state = AppState {
        sessions: sessions.clone() as SessionStoreState,
        api: Arc::new(LocalPlatformApi::new()),
        storage: Arc::new(MockStorageService::new()),
        config,
    };
    (state, sessions)
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn test_user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        role,
        is_profile_complete: true,
        ..Default::default()
    }
}

async fn seed_session(sessions: &MemorySessionStore, user: &User) -> Uuid {
    let sid = Uuid::new_v4();
    sessions
        .save_session(sid, &Session::new(user.clone(), "api-token".to_string(), 3600))
        .await
        .unwrap();
    sid
}

fn with_cookie(parts: &mut Parts, state: &AppState, sid: Uuid) {
    let token = issue_session_token(&state.config, sid).unwrap();
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}")).unwrap(),
    );
}

// --- Session cookie ---

#[test]
fn test_session_token_round_trip_and_wrong_secret() {
    let mut config = AppConfig::default();
    let sid = Uuid::new_v4();
    let token = issue_session_token(&config, sid).unwrap();
    assert_eq!(decode_session_token(&config, &token), Some(sid));

    config.session_secret = "another-secret".to_string();
    assert_eq!(decode_session_token(&config, &token), None);
    assert_eq!(decode_session_token(&config, "not-a-jwt"), None);
}

#[test]
fn test_session_cookie_attributes() {
    let mut config = AppConfig::default();
    let cookie = auth::session_cookie(&config, "abc");
    assert!(cookie.starts_with("edu_session=abc;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    config.cookie_secure = true;
    assert!(auth::session_cookie(&config, "abc").ends_with("; Secure"));
    assert!(auth::clear_session_cookie(&config).contains("Max-Age=0"));
}

// --- AuthContext extractor ---

#[tokio::test]
async fn test_context_restored_from_cookie() {
    let (state, sessions) = create_app_state(Env::Production);
    let user = test_user(Role::Tutor);
    let sid = seed_session(&sessions, &user).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_cookie(&mut parts, &state, sid);

    let Ok(ctx) = AuthContext::from_request_parts(&mut parts, &state).await;
    assert!(!ctx.is_loading());
    assert!(ctx.is_authenticated());
    assert_eq!(ctx.user(), Some(&user));
    assert_eq!(ctx.token(), Some("api-token"));
    assert_eq!(ctx.session_id(), Some(sid));
}

#[tokio::test]
async fn test_context_without_cookie_is_ready_and_anonymous() {
    let (state, _) = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let Ok(ctx) = AuthContext::from_request_parts(&mut parts, &state).await;
    assert!(!ctx.is_loading());
    assert!(!ctx.is_authenticated());
}

#[tokio::test]
async fn test_context_with_forged_cookie_is_anonymous() {
    let (state, sessions) = create_app_state(Env::Production);
    let sid = seed_session(&sessions, &test_user(Role::Student)).await;

    let mut forged = state.config.clone();
    forged.session_secret = "attacker".to_string();
    let token = issue_session_token(&forged, sid).unwrap();

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
    );

    let Ok(ctx) = AuthContext::from_request_parts(&mut parts, &state).await;
    assert!(!ctx.is_authenticated());
}

#[tokio::test]
async fn test_context_is_cached_per_request() {
    let (state, sessions) = create_app_state(Env::Production);
    let user = test_user(Role::Student);
    let sid = seed_session(&sessions, &user).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_cookie(&mut parts, &state, sid);
    let Ok(first) = AuthContext::from_request_parts(&mut parts, &state).await;

    // The store changes, but this request keeps the state it restored.
    sessions.logout(sid).await.unwrap();
    let Ok(second) = AuthContext::from_request_parts(&mut parts, &state).await;
    assert_eq!(first.user(), second.user());
    assert!(second.is_authenticated());
}

#[tokio::test]
async fn test_local_bypass_header() {
    let (state, sessions) = create_app_state(Env::Local);
    let user = test_user(Role::Affiliate);
    let sid = seed_session(&sessions, &user).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(SESSION_HEADER),
        header::HeaderValue::from_str(&sid.to_string()).unwrap(),
    );

    let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(current.user, user);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let (state, sessions) = create_app_state(Env::Production);
    let sid = seed_session(&sessions, &test_user(Role::Affiliate)).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(SESSION_HEADER),
        header::HeaderValue::from_str(&sid.to_string()).unwrap(),
    );

    let current = CurrentUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(current.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_super_admin_extractor() {
    let (state, sessions) = create_app_state(Env::Production);

    let student_sid = seed_session(&sessions, &test_user(Role::Student)).await;
    let mut parts = get_request_parts(Method::GET, "/admin".parse().unwrap());
    with_cookie(&mut parts, &state, student_sid);
    let refused = SuperAdmin::from_request_parts(&mut parts, &state).await;
    assert_eq!(refused.unwrap_err(), StatusCode::FORBIDDEN);

    let admin = test_user(Role::SuperAdmin);
    let admin_sid = seed_session(&sessions, &admin).await;
    let mut parts = get_request_parts(Method::GET, "/admin".parse().unwrap());
    with_cookie(&mut parts, &state, admin_sid);
    let allowed = SuperAdmin::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(allowed.user.id, admin.id);
}

// --- AuthContext transitions ---

#[tokio::test]
async fn test_login_mints_new_session_and_drops_old() {
    let sessions = Arc::new(MemorySessionStore::new());
    let store = sessions.clone() as SessionStoreState;
    let old_sid = seed_session(&sessions, &test_user(Role::Student)).await;

    let mut ctx = AuthContext::restore(store, 3600, Some(old_sid)).await;
    let tutor = test_user(Role::Tutor);
    let new_sid = ctx.login(tutor.clone(), "tutor-token".to_string()).await.unwrap();

    assert_ne!(new_sid, old_sid);
    assert_eq!(ctx.user(), Some(&tutor));
    assert!(sessions.get_session(old_sid).await.unwrap().is_none());
    assert_eq!(sessions.get_session(new_sid).await.unwrap().unwrap().user, tutor);
}

#[tokio::test]
async fn test_logout_and_update_user() {
    let sessions = Arc::new(MemorySessionStore::new());
    let store = sessions.clone() as SessionStoreState;
    let mut user = test_user(Role::Student);
    user.is_profile_complete = false;
    let sid = seed_session(&sessions, &user).await;

    let mut ctx = AuthContext::restore(store.clone(), 3600, Some(sid)).await;
    user.is_profile_complete = true;
    ctx.update_user(user.clone()).await.unwrap();
    assert!(ctx.user().unwrap().is_profile_complete);
    assert!(sessions.get_session(sid).await.unwrap().unwrap().user.is_profile_complete);

    ctx.logout().await.unwrap();
    assert!(!ctx.is_authenticated());
    assert!(sessions.get_session(sid).await.unwrap().is_none());

    // Anonymous contexts cannot be updated, and signing out again is a no-op.
    assert!(matches!(ctx.update_user(user).await, Err(SessionError::NoSession)));
    ctx.logout().await.unwrap();
}

#[tokio::test]
async fn test_context_impersonation_transitions() {
    let sessions = Arc::new(MemorySessionStore::new());
    let store = sessions.clone() as SessionStoreState;
    let admin = test_user(Role::SuperAdmin);
    let student = test_user(Role::Student);
    let sid = seed_session(&sessions, &admin).await;

    let mut ctx = AuthContext::restore(store, 3600, Some(sid)).await;
    ctx.start_impersonation(student.clone(), "student-token".to_string())
        .await
        .unwrap();
    assert!(ctx.is_impersonating());
    assert_eq!(ctx.user(), Some(&student));

    let restored = ctx.exit_impersonation().await.unwrap();
    assert_eq!(restored, admin);
    assert!(!ctx.is_impersonating());
    assert_eq!(ctx.token(), Some("api-token"));
}

/// Delegates to an in-memory store but refuses every write.
struct ReadOnlySessionStore {
    inner: MemorySessionStore,
}

#[async_trait::async_trait]
impl SessionStore for ReadOnlySessionStore {
    async fn get_session(&self, sid: Uuid) -> Result<Option<Session>, SessionError> {
        self.inner.get_session(sid).await
    }

    async fn save_session(&self, _sid: Uuid, _session: &Session) -> Result<(), SessionError> {
        Err(SessionError::Storage("read-only".to_string()))
    }

    async fn logout(&self, sid: Uuid) -> Result<(), SessionError> {
        self.inner.logout(sid).await
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        self.inner.purge_expired().await
    }
}

#[tokio::test]
async fn test_failed_login_leaves_context_signed_out() {
    let inner = MemorySessionStore::new();
    let student = test_user(Role::Student);
    let old_sid = seed_session(&inner, &student).await;
    let store = Arc::new(ReadOnlySessionStore { inner }) as SessionStoreState;

    let mut ctx = AuthContext::restore(store, 3600, Some(old_sid)).await;
    assert_eq!(ctx.user(), Some(&student));

    let result = ctx.login(test_user(Role::Tutor), "tutor-token".to_string()).await;

    assert!(matches!(result, Err(SessionError::Storage(_))));
    assert!(!ctx.is_authenticated());
    assert!(ctx.session().is_none());
    assert!(ctx.session_id().is_none());
}

#[tokio::test]
async fn test_login_purges_expired_sessions() {
    let sessions = Arc::new(MemorySessionStore::new());
    let store = sessions.clone() as SessionStoreState;

    let mut stale = Session::new(test_user(Role::Student), "old".to_string(), 3600);
    stale.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
    sessions.save_session(Uuid::new_v4(), &stale).await.unwrap();

    let mut ctx = AuthContext::restore(store, 3600, None).await;
    ctx.login(test_user(Role::Tutor), "tutor-token".to_string()).await.unwrap();

    assert_eq!(sessions.purge_expired().await.unwrap(), 0);
}
