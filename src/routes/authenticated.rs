use crate::{AppState, handlers::account};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Pages for any signed-in role. Handlers take the `CurrentUser` extractor and
/// call the platform API with the session's bearer token, so the platform
/// applies its own ownership rules.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET|POST /onboarding
        // The profile-completion form. Submitting it marks the profile complete
        // in the session, which lifts the onboarding redirect.
        .route(
            "/onboarding",
            get(account::onboarding_page).post(account::complete_onboarding),
        )
        // GET /dashboard
        .route("/dashboard", get(account::dashboard))
        // GET|PUT /profile
        .route("/profile", get(account::profile).put(account::update_profile))
        // --- Support tickets ---
        // GET|POST /tickets
        .route("/tickets", get(account::tickets).post(account::create_ticket))
        // GET|PUT|DELETE /tickets/{id}
        .route(
            "/tickets/{id}",
            get(account::ticket)
                .put(account::update_ticket)
                .delete(account::delete_ticket),
        )
        // POST /tickets/{id}/replies
        .route("/tickets/{id}/replies", post(account::reply_to_ticket))
        // --- Notifications ---
        // GET /notifications
        .route("/notifications", get(account::notifications))
        // GET /notifications/unread-count
        // Polled by the client for the header badge.
        .route("/notifications/unread-count", get(account::unread_count))
        // PATCH /notifications/{id}/read
        .route(
            "/notifications/{id}/read",
            patch(account::mark_notification_read),
        )
        // --- Chat ---
        // GET|POST /chat?with=...
        .route("/chat", get(account::chat).post(account::send_chat))
}
