use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::SessionError, models::User};

/// Opaque identifier of one browser session. Carried inside the signed cookie.
pub type SessionId = Uuid;

/// Impersonator
///
/// The admin identity parked while they act as another user. Restored verbatim
/// by `exit_impersonation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impersonator {
    pub user: User,
    pub token: String,
}

/// Session
///
/// The currently active identity of one browser session, plus the
/// impersonated-by marker when an admin is acting as someone else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    // Bearer token for the remote platform API, issued for `user`.
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonator: Option<Impersonator>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: User, token: String, ttl_secs: u64) -> Self {
        let created_at = Utc::now();
        Self {
            user,
            token,
            impersonator: None,
            created_at,
            expires_at: expiry(created_at, ttl_secs),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_impersonating(&self) -> bool {
        self.impersonator.is_some()
    }
}

/// `from + secs`, saturating at the latest representable instant.
fn expiry(from: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| from.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// 1. SessionStore Contract
/// SessionStore
///
/// The single source of truth for who is signed in on each browser session.
/// Only sign-in, sign-out and the impersonation transitions write to it.
///
/// Backends implement the three primitive operations; the impersonation
/// transitions are expressed on top of them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the live session for `sid`. Expired sessions read as `None`.
    async fn get_session(&self, sid: SessionId) -> Result<Option<Session>, SessionError>;

    /// Creates or replaces the session stored under `sid`.
    async fn save_session(&self, sid: SessionId, session: &Session) -> Result<(), SessionError>;

    /// Forgets `sid`. Removing an unknown session is not an error.
    async fn logout(&self, sid: SessionId) -> Result<(), SessionError>;

    /// Deletes every expired session and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionError>;

    async fn is_impersonating(&self, sid: SessionId) -> Result<bool, SessionError> {
        Ok(self
            .get_session(sid)
            .await?
            .is_some_and(|session| session.is_impersonating()))
    }

    /// Switches the session to `target`, parking the current identity as the
    /// impersonator. Impersonation does not nest.
    async fn start_impersonation(
        &self,
        sid: SessionId,
        target: User,
        token: String,
    ) -> Result<Session, SessionError> {
        let current = self.get_session(sid).await?.ok_or(SessionError::NoSession)?;
        if current.is_impersonating() {
            return Err(SessionError::AlreadyImpersonating);
        }

        let session = Session {
            user: target,
            token,
            impersonator: Some(Impersonator {
                user: current.user,
                token: current.token,
            }),
            created_at: Utc::now(),
            expires_at: current.expires_at,
        };
        self.save_session(sid, &session).await?;
        Ok(session)
    }

    /// Restores the original admin identity and clears the marker.
    async fn exit_impersonation(&self, sid: SessionId) -> Result<Session, SessionError> {
        let current = self.get_session(sid).await?.ok_or(SessionError::NoSession)?;
        let admin = current.impersonator.ok_or(SessionError::NotImpersonating)?;

        let session = Session {
            user: admin.user,
            token: admin.token,
            impersonator: None,
            created_at: Utc::now(),
            expires_at: current.expires_at,
        };
        self.save_session(sid, &session).await?;
        Ok(session)
    }
}

/// SessionStoreState
///
/// The concrete type used to share the session store across the application state.
pub type SessionStoreState = Arc<dyn SessionStore>;

// 2. In-memory backend
/// MemorySessionStore
///
/// Keeps sessions in process memory. Used for local development, for tests,
/// and whenever no `DATABASE_URL` is configured. Sessions do not survive a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session(&self, sid: SessionId) -> Result<Option<Session>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&sid).filter(|s| !s.is_expired()).cloned())
    }

    async fn save_session(&self, sid: SessionId, session: &Session) -> Result<(), SessionError> {
        self.sessions.write().await.insert(sid, session.clone());
        Ok(())
    }

    async fn logout(&self, sid: SessionId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(&sid);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

// 3. Postgres backend
/// PostgresSessionStore
///
/// Persists sessions in the `portal_sessions` table so they survive restarts
/// and are shared between replicas. The session body is stored as JSON text.
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the sessions table if it is missing. Safe to call at every startup.
    pub async fn ensure_schema(&self) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS portal_sessions (
                id UUID PRIMARY KEY,
                body TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn get_session(&self, sid: SessionId) -> Result<Option<Session>, SessionError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT body FROM portal_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(sid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn save_session(&self, sid: SessionId, session: &Session) -> Result<(), SessionError> {
        let body = serde_json::to_string(session)?;
        sqlx::query(
            r#"
            INSERT INTO portal_sessions (id, body, expires_at, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (id) DO UPDATE
            SET body = EXCLUDED.body, expires_at = EXCLUDED.expires_at, updated_at = now()
            "#,
        )
        .bind(sid)
        .bind(body)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn logout(&self, sid: SessionId) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM portal_sessions WHERE id = $1")
            .bind(sid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM portal_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
