use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use super::page;
use crate::{
    AppState,
    auth::{AuthContext, CurrentUser},
    error::AppError,
    models::{
        ChatMessage, CreateReplyRequest, CreateTicketRequest, DashboardPage, LoginOutcome,
        Notification, OnboardingPage, PageView, ProfileUpdate, SendMessageRequest, Ticket,
        TicketScope, UnreadCount, UpdateTicketRequest, User,
    },
    routing,
    services::{account, support},
};

/// Notifications shown on the dashboard.
const RECENT_NOTIFICATIONS: usize = 5;

// --- Onboarding & profile ---

/// onboarding_page
///
/// [Authenticated Route] The profile-completion form and the fields the
/// user's role must fill in.
#[utoipa::path(
    get,
    path = "/onboarding",
    responses((status = 200, description = "Onboarding form", body = OnboardingPage))
)]
pub async fn onboarding_page(ctx: AuthContext, CurrentUser { user, .. }: CurrentUser) -> Json<PageView<OnboardingPage>> {
    let data = OnboardingPage {
        required_fields: account::required_onboarding_fields(user.role),
        user,
    };
    page("onboarding", &ctx, routing::ONBOARDING, data)
}

/// complete_onboarding
///
/// [Authenticated Route] Submits the onboarding answers. The refreshed user
/// (now complete) replaces the one in the session, which unlocks the portal.
#[utoipa::path(
    post,
    path = "/onboarding",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile completed", body = LoginOutcome),
        (status = 422, description = "Required fields missing")
    )
)]
pub async fn complete_onboarding(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    CurrentUser { user, token }: CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<LoginOutcome>, AppError> {
    let missing = account::missing_onboarding_fields(user.role, &payload);
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let updated = account::complete_onboarding(state.api.as_ref(), &token, &payload).await?;
    ctx.update_user(updated.clone()).await?;
    tracing::info!(user_id = %updated.id, "onboarding completed");

    Ok(Json(LoginOutcome {
        user: updated,
        redirect_to: routing::HOME.to_string(),
    }))
}

#[utoipa::path(get, path = "/profile", responses((status = 200, description = "Profile", body = User)))]
pub async fn profile(ctx: AuthContext, CurrentUser { user, .. }: CurrentUser) -> Json<PageView<User>> {
    page("profile", &ctx, "/profile", user)
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileUpdate,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    CurrentUser { token, .. }: CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let updated = account::update_profile(state.api.as_ref(), &token, &payload).await?;
    ctx.update_user(updated.clone()).await?;
    Ok(Json(updated))
}

/// dashboard
///
/// [Authenticated Route] The signed-in landing screen.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard", body = DashboardPage))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    ctx: AuthContext,
    CurrentUser { user, token }: CurrentUser,
) -> Json<PageView<DashboardPage>> {
    let api = state.api.as_ref();
    let notifications = account::notifications(api, &token).await;
    let tickets = support::list_tickets(api, &token, TicketScope::Mine).await;

    let data = DashboardPage {
        unread_notifications: notifications.iter().filter(|n| !n.is_read).count(),
        open_tickets: support::count_open(&tickets),
        recent_notifications: notifications.into_iter().take(RECENT_NOTIFICATIONS).collect(),
        user,
    };
    page("dashboard", &ctx, routing::DASHBOARD, data)
}

// --- Tickets ---

#[utoipa::path(get, path = "/tickets", responses((status = 200, description = "My tickets", body = [Ticket])))]
pub async fn tickets(
    State(state): State<AppState>,
    ctx: AuthContext,
    CurrentUser { token, .. }: CurrentUser,
) -> Json<PageView<Vec<Ticket>>> {
    let tickets = support::list_tickets(state.api.as_ref(), &token, TicketScope::Mine).await;
    page("tickets", &ctx, "/tickets", tickets)
}

/// create_ticket
///
/// [Authenticated Route] Opens a support ticket. Failures are reported to the user.
#[utoipa::path(
    post,
    path = "/tickets",
    request_body = CreateTicketRequest,
    responses((status = 201, description = "Created", body = Ticket))
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    if payload.subject.trim().is_empty() {
        return Err(AppError::Validation("subject is required".to_string()));
    }
    let ticket = support::create_ticket(state.api.as_ref(), &token, &payload).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[utoipa::path(
    get,
    path = "/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket", body = Ticket),
        (status = 404, description = "Not Found")
    )
)]
pub async fn ticket(
    State(state): State<AppState>,
    ctx: AuthContext,
    CurrentUser { token, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PageView<Ticket>>, StatusCode> {
    match support::get_ticket(state.api.as_ref(), &token, id).await {
        Some(ticket) => Ok(page("ticket", &ctx, "/tickets", ticket)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[utoipa::path(
    put,
    path = "/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateTicketRequest,
    responses((status = 200, description = "Updated", body = Ticket))
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketRequest>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = support::update_ticket(state.api.as_ref(), &token, id, &payload).await?;
    Ok(Json(ticket))
}

#[utoipa::path(
    delete,
    path = "/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_ticket(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    support::delete_ticket(state.api.as_ref(), &token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/tickets/{id}/replies",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = CreateReplyRequest,
    responses((status = 201, description = "Reply added", body = Ticket))
)]
pub async fn reply_to_ticket(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }
    let ticket = support::reply_to_ticket(state.api.as_ref(), &token, id, &payload).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

// --- Notifications ---

#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "My notifications", body = [Notification]))
)]
pub async fn notifications(
    State(state): State<AppState>,
    ctx: AuthContext,
    CurrentUser { token, .. }: CurrentUser,
) -> Json<PageView<Vec<Notification>>> {
    let notifications = account::notifications(state.api.as_ref(), &token).await;
    page("notifications", &ctx, "/notifications", notifications)
}

/// unread_count
///
/// [Authenticated Route] Badge counter the client polls.
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    responses((status = 200, description = "Unread count", body = UnreadCount))
)]
pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
) -> Json<UnreadCount> {
    Json(UnreadCount {
        unread: account::unread_count(state.api.as_ref(), &token).await,
    })
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if account::mark_notification_read(state.api.as_ref(), &token, id).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Chat ---

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ConversationQuery {
    /// Restrict the thread to messages exchanged with this user.
    pub with: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/chat",
    params(ConversationQuery),
    responses((status = 200, description = "Messages", body = [ChatMessage]))
)]
pub async fn chat(
    State(state): State<AppState>,
    ctx: AuthContext,
    CurrentUser { token, .. }: CurrentUser,
    Query(query): Query<ConversationQuery>,
) -> Json<PageView<Vec<ChatMessage>>> {
    let messages = account::conversation(state.api.as_ref(), &token, query.with).await;
    page("chat", &ctx, "/chat", messages)
}

#[utoipa::path(
    post,
    path = "/chat",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Sent", body = ChatMessage),
        (status = 502, description = "Not delivered")
    )
)]
pub async fn send_chat(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), StatusCode> {
    match account::send_message(state.api.as_ref(), &token, &payload).await {
        Some(message) => Ok((StatusCode::CREATED, Json(message))),
        None => Err(StatusCode::BAD_GATEWAY),
    }
}
