use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use super::{page, sign_in, with_cookie};
use crate::{
    AppState,
    auth::{self, AuthContext},
    error::AppError,
    models::{
        CreateInquiryRequest, Inquiry, LoginOutcome, LoginRequest, PageView, ResetPasswordRequest,
        User,
    },
    routing,
    services::{account, support},
};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct LoginPageQuery {
    /// Location the visitor was bounced from by `ProtectedRoute`.
    pub from: Option<String>,
}

#[derive(Serialize)]
pub struct LoginPage {
    pub from: Option<String>,
    pub signed_in_as: Option<User>,
}

/// login_page
///
/// [Gateway Route] The sign-in screen. Echoes the sanitised `from` so the
/// form can post it back.
#[utoipa::path(
    get,
    path = "/login",
    params(LoginPageQuery),
    responses((status = 200, description = "Login page"))
)]
pub async fn login_page(ctx: AuthContext, Query(query): Query<LoginPageQuery>) -> Json<PageView<LoginPage>> {
    let from = routing::safe_return_path(query.from.as_deref()).map(str::to_string);
    let data = LoginPage {
        from,
        signed_in_as: ctx.user().cloned(),
    };
    page("login", &ctx, routing::LOGIN, data)
}

/// login
///
/// [Gateway Route] Password sign-in against the platform API. On success the
/// session cookie is set and `redirect_to` points at onboarding, the
/// remembered location, or home.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginOutcome),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let grant = account::login(state.api.as_ref(), &payload.email, &payload.password).await?;
    let (cookie, outcome) = sign_in(&state.config, &mut ctx, grant, payload.from.as_deref()).await?;
    Ok(with_cookie(cookie, Json(outcome)))
}

/// logout
///
/// [Gateway Route] Drops the session and clears the cookie.
#[utoipa::path(post, path = "/logout", responses((status = 204, description = "Signed out")))]
pub async fn logout(State(state): State<AppState>, mut ctx: AuthContext) -> Result<Response, AppError> {
    ctx.logout().await?;
    Ok(with_cookie(
        auth::clear_session_cookie(&state.config),
        StatusCode::NO_CONTENT,
    ))
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct GoogleCallbackQuery {
    pub code: String,
    /// Carried through the OAuth round-trip as `state`.
    pub state: Option<String>,
}

/// google_callback
///
/// [Gateway Route] Completes Google sign-in. The browser arrives here from the
/// provider, so the answer is a redirect rather than JSON.
#[utoipa::path(
    get,
    path = "/google-callback",
    params(GoogleCallbackQuery),
    responses((status = 303, description = "Signed in, or sent back to /login"))
)]
pub async fn google_callback(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    Query(query): Query<GoogleCallbackQuery>,
) -> Response {
    let grant = match account::google_login(state.api.as_ref(), &query.code).await {
        Ok(grant) => grant,
        Err(_) => return Redirect::to("/login?error=google_sign_in_failed").into_response(),
    };

    match sign_in(&state.config, &mut ctx, grant, query.state.as_deref()).await {
        Ok((cookie, outcome)) => with_cookie(cookie, Redirect::to(&outcome.redirect_to)),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ResetPasswordQuery {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct ResetPasswordPage {
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/reset-password",
    params(ResetPasswordQuery),
    responses((status = 200, description = "Reset password page"))
)]
pub async fn reset_password_page(
    ctx: AuthContext,
    Query(query): Query<ResetPasswordQuery>,
) -> Json<PageView<ResetPasswordPage>> {
    page(
        "reset_password",
        &ctx,
        routing::RESET_PASSWORD,
        ResetPasswordPage { token: query.token },
    )
}

/// reset_password
///
/// [Gateway Route] Sets a new password using the emailed reset token.
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Token rejected")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    if payload.new_password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    account::reset_password(state.api.as_ref(), &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ContactPage {
    pub support_email: String,
}

#[utoipa::path(get, path = "/contact", responses((status = 200, description = "Contact page")))]
pub async fn contact_page(State(state): State<AppState>, ctx: AuthContext) -> Json<PageView<ContactPage>> {
    let settings = account::settings(state.api.as_ref()).await;
    page(
        "contact",
        &ctx,
        routing::CONTACT,
        ContactPage {
            support_email: settings.support_email,
        },
    )
}

/// submit_contact
///
/// [Gateway Route] Files a contact-form inquiry. Open to everyone, including
/// users who have not finished onboarding.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = CreateInquiryRequest,
    responses((status = 201, description = "Inquiry filed", body = Inquiry))
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<CreateInquiryRequest>,
) -> Result<(StatusCode, Json<Inquiry>), AppError> {
    if payload.email.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(AppError::Validation("email and message are required".to_string()));
    }
    let inquiry = support::submit_inquiry(state.api.as_ref(), &payload).await?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}

/// exit_impersonation
///
/// [Gateway Route] The banner's exit action: restores the admin identity.
#[utoipa::path(
    post,
    path = "/impersonation/exit",
    responses(
        (status = 200, description = "Admin identity restored", body = LoginOutcome),
        (status = 409, description = "Not impersonating")
    )
)]
pub async fn exit_impersonation(mut ctx: AuthContext) -> Result<Json<LoginOutcome>, AppError> {
    let admin = ctx.exit_impersonation().await?;
    Ok(Json(LoginOutcome {
        user: admin,
        redirect_to: routing::ADMIN.to_string(),
    }))
}
