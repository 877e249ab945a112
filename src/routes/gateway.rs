use crate::{
    AppState,
    handlers::gateway,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Gateway Router Module
///
/// Sign-in, password reset and contact pages. Every path here is on the
/// onboarding allow-list, so a user with an unfinished profile can still reach them.
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        // GET|POST /login
        // The sign-in page and the password sign-in action. `from` carries the
        // location ProtectedRoute bounced the visitor away from.
        .route("/login", get(gateway::login_page).post(gateway::login))
        // GET /google-callback?code=...&state=...
        // OAuth landing point. Answers with a redirect, never with a page.
        .route("/google-callback", get(gateway::google_callback))
        // GET|POST /reset-password
        .route(
            "/reset-password",
            get(gateway::reset_password_page).post(gateway::reset_password),
        )
        // GET|POST /contact
        // The contact form; a submission files an inquiry for the admins.
        .route("/contact", get(gateway::contact_page).post(gateway::submit_contact))
}

/// Session actions that must stay reachable in every state, including an
/// unfinished profile. Mounted outside the page guards.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /logout
        .route("/logout", post(gateway::logout))
        // POST /impersonation/exit
        // The banner's exit action. Restores the parked admin identity.
        .route("/impersonation/exit", post(gateway::exit_impersonation))
}
