//! Page and action handlers.
//!
//! Pages answer with a [`PageView`] envelope so the impersonation banner rides
//! along with every screen. Actions answer with the resource they touched, or
//! with a `LoginOutcome` when they change who is signed in.

use axum::{
    Json,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    access,
    auth::{self, AuthContext},
    banner::ImpersonationBanner,
    config::AppConfig,
    error::AppError,
    models::{AuthGrant, LoginOutcome, PageView},
};

pub mod account;
pub mod admin;
pub mod gateway;
pub mod pages;

/// Wraps page data with the banner state for `path`.
pub(crate) fn page<T>(name: &'static str, ctx: &AuthContext, path: &str, data: T) -> Json<PageView<T>> {
    Json(PageView {
        page: name,
        banner: ImpersonationBanner::render(ctx, path),
        data,
    })
}

/// sign_in
///
/// Shared tail of every sign-in flow: open a fresh session for the grant,
/// install the signed cookie and tell the client where to go next.
pub(crate) async fn sign_in(
    config: &AppConfig,
    ctx: &mut AuthContext,
    grant: AuthGrant,
    from: Option<&str>,
) -> Result<(String, LoginOutcome), AppError> {
    let redirect_to = access::post_login_destination(&grant.user, from);
    let sid = ctx.login(grant.user.clone(), grant.token).await?;
    let cookie = auth::session_cookie(config, &auth::issue_session_token(config, sid)?);

    Ok((
        cookie,
        LoginOutcome {
            user: grant.user,
            redirect_to,
        },
    ))
}

pub(crate) fn with_cookie(cookie: String, body: impl IntoResponse) -> Response {
    ([(header::SET_COOKIE, cookie)], body).into_response()
}
