use uuid::Uuid;

use super::{or_default, surfaced};
use crate::{
    api::PlatformApi,
    error::ApiError,
    models::{
        AuthGrant, ChatMessage, Notification, ProfileUpdate, ResetPasswordRequest, Role,
        SendMessageRequest, SystemSettings, User,
    },
};

// --- Identity ---

pub async fn login(api: &dyn PlatformApi, email: &str, password: &str) -> Result<AuthGrant, ApiError> {
    surfaced("login", api.login(email, password).await)
}

pub async fn google_login(api: &dyn PlatformApi, code: &str) -> Result<AuthGrant, ApiError> {
    surfaced("google_login", api.google_login(code).await)
}

pub async fn reset_password(api: &dyn PlatformApi, req: &ResetPasswordRequest) -> Result<(), ApiError> {
    surfaced("reset_password", api.reset_password(req).await)
}

pub async fn complete_onboarding(
    api: &dyn PlatformApi,
    token: &str,
    update: &ProfileUpdate,
) -> Result<User, ApiError> {
    surfaced("complete_onboarding", api.complete_onboarding(token, update).await)
}

pub async fn update_profile(
    api: &dyn PlatformApi,
    token: &str,
    update: &ProfileUpdate,
) -> Result<User, ApiError> {
    surfaced("update_profile", api.update_profile(token, update).await)
}

pub async fn list_users(api: &dyn PlatformApi, token: &str) -> Vec<User> {
    or_default("list_users", api.list_users(token).await)
}

pub async fn impersonate(api: &dyn PlatformApi, token: &str, user_id: Uuid) -> Result<AuthGrant, ApiError> {
    surfaced("impersonate", api.impersonate(token, user_id).await)
}

/// The onboarding fields a role must provide before its profile counts as complete.
pub fn required_onboarding_fields(role: Role) -> Vec<String> {
    let fields: &[&str] = match role {
        Role::Student => &["name", "phone", "batch"],
        Role::Tutor => &["name", "phone", "skills", "topics"],
        Role::Affiliate => &["name", "phone", "coupon_code"],
        Role::SuperAdmin => &["name"],
    };
    fields.iter().map(|f| f.to_string()).collect()
}

/// Names of required fields the submission leaves empty.
pub fn missing_onboarding_fields(role: Role, update: &ProfileUpdate) -> Vec<String> {
    let filled = |field: &str| -> bool {
        match field {
            "name" => update.name.as_deref().is_some_and(|v| !v.trim().is_empty()),
            "phone" => update.phone.as_deref().is_some_and(|v| !v.trim().is_empty()),
            "batch" => update.batch.as_deref().is_some_and(|v| !v.trim().is_empty()),
            "coupon_code" => update.coupon_code.as_deref().is_some_and(|v| !v.trim().is_empty()),
            "skills" => update.skills.as_ref().is_some_and(|v| !v.is_empty()),
            "topics" => update.topics.as_ref().is_some_and(|v| !v.is_empty()),
            _ => true,
        }
    };
    required_onboarding_fields(role)
        .into_iter()
        .filter(|field| !filled(field))
        .collect()
}

// --- Notifications ---

pub async fn notifications(api: &dyn PlatformApi, token: &str) -> Vec<Notification> {
    or_default("notifications", api.list_notifications(token).await)
}

pub async fn unread_count(api: &dyn PlatformApi, token: &str) -> usize {
    notifications(api, token)
        .await
        .iter()
        .filter(|n| !n.is_read)
        .count()
}

/// Returns whether the notification was marked; failures are only logged.
pub async fn mark_notification_read(api: &dyn PlatformApi, token: &str, id: Uuid) -> bool {
    match api.mark_notification_read(token, id).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, notification = %id, "could not mark notification read");
            false
        }
    }
}

// --- Chat ---

pub async fn conversation(api: &dyn PlatformApi, token: &str, with: Option<Uuid>) -> Vec<ChatMessage> {
    or_default("conversation", api.list_messages(token, with).await)
}

pub async fn send_message(api: &dyn PlatformApi, token: &str, req: &SendMessageRequest) -> Option<ChatMessage> {
    match api.send_message(token, req).await {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!(error = %e, recipient = %req.recipient_id, "chat message not delivered");
            None
        }
    }
}

// --- System settings ---

pub async fn settings(api: &dyn PlatformApi) -> SystemSettings {
    or_default("settings", api.get_settings().await)
}

pub async fn update_settings(
    api: &dyn PlatformApi,
    token: &str,
    settings: &SystemSettings,
) -> Option<SystemSettings> {
    match api.update_settings(token, settings).await {
        Ok(saved) => Some(saved),
        Err(e) => {
            tracing::warn!(error = %e, "settings not saved");
            None
        }
    }
}
