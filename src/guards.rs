//! Route guards as axum middleware.
//!
//! Each guard restores the request's `AuthContext` (cached after the first
//! extraction), asks the matching decision function in [`crate::access`], and
//! then either runs the nested route or answers in its place: a `303` redirect
//! with an empty body, or a loading placeholder.

use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect as HttpRedirect, Response},
};

use crate::{
    access::{self, Decision, OnboardingPolicy},
    auth::AuthContext,
    config::AppConfig,
};

/// The path the visitor asked for, before any router nesting stripped a prefix.
fn request_path(request: &Request) -> &str {
    request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| request.uri().path())
}

/// Path plus query string, remembered as the post-login return location.
fn request_location(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| &uri.0)
        .unwrap_or_else(|| request.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

async fn enforce(decision: Decision, request: Request, next: Next) -> Response {
    match decision {
        Decision::Render => next.run(request).await,
        Decision::Redirect(redirect) => HttpRedirect::to(&redirect.location()).into_response(),
        Decision::Placeholder => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "1")],
            Json(serde_json::json!({ "page": "loading" })),
        )
            .into_response(),
    }
}

/// ProtectedRoute
///
/// Only signed-in users with a settled onboarding state reach the nested routes.
pub async fn protected_route(ctx: AuthContext, request: Request, next: Next) -> Response {
    let path = request_path(&request).to_string();
    let mut state = access::protected_route(ctx.state(), &path);

    // Keep the query string when bouncing to the login page.
    if let access::ProtectedState::Unauthenticated { from } = &mut state {
        *from = request_location(&request);
    }

    if state != access::ProtectedState::Authorized {
        tracing::debug!(%path, ?state, "protected route diverted");
    }
    enforce(state.decision(), request, next).await
}

/// PublicRoute
///
/// Open to everyone, but pushes a signed-in user with an unfinished profile to
/// onboarding (super_admin excepted).
pub async fn public_route(ctx: AuthContext, request: Request, next: Next) -> Response {
    let decision = access::public_route(ctx.state());
    if decision != Decision::Render {
        tracing::debug!(path = %request_path(&request), ?decision, "public route diverted");
    }
    enforce(decision, request, next).await
}

/// OnboardingGuard
///
/// Wraps page content: outside the allow-list, a signed-in user with an
/// unfinished profile gets a redirect and no content at all.
pub async fn onboarding_guard(
    State(config): State<AppConfig>,
    ctx: AuthContext,
    request: Request,
    next: Next,
) -> Response {
    let policy = OnboardingPolicy {
        exempt_super_admin: config.onboarding_guard_exempts_super_admin,
        ..OnboardingPolicy::default()
    };
    let decision = access::onboarding_guard(ctx.state(), request_path(&request), &policy);
    if decision != Decision::Render {
        tracing::debug!(path = %request_path(&request), "onboarding guard suppressed content");
    }
    enforce(decision, request, next).await
}
