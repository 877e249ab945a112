//! Route access decisions.
//!
//! These are pure functions over the restored authentication state and the
//! requested path. The axum middleware in [`crate::guards`] evaluates them;
//! keeping them free of I/O lets every rule be checked exhaustively in tests.

use crate::{
    models::User,
    routing::{self, RoutePattern, RouteTable},
};

/// AuthState
///
/// The lifecycle of an `AuthContext`: it starts `Loading` and becomes `Ready`
/// once session restoration finishes, whether or not a user was found.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Loading,
    Ready(Option<User>),
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Ready(user) => user.as_ref(),
            AuthState::Loading => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// Redirect
///
/// Where a guard sends the visitor. `from` carries the originally requested
/// location so sign-in can return there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
    pub from: Option<String>,
}

impl Redirect {
    pub fn to(to: &'static str) -> Self {
        Self { to, from: None }
    }

    pub fn to_login(from: &str) -> Self {
        Self {
            to: routing::LOGIN,
            from: Some(from.to_string()),
        }
    }

    /// The value for a `Location` header.
    pub fn location(&self) -> String {
        match &self.from {
            Some(from) => format!("{}?from={}", self.to, urlencoding::encode(from)),
            None => self.to.to_string(),
        }
    }
}

/// ProtectedState
///
/// The terminal states of the `ProtectedRoute` state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedState {
    Loading,
    Unauthenticated { from: String },
    OnboardingRequired,
    OnboardingRedundant,
    Authorized,
}

impl ProtectedState {
    pub fn decision(&self) -> Decision {
        match self {
            ProtectedState::Loading => Decision::Placeholder,
            ProtectedState::Unauthenticated { from } => Decision::Redirect(Redirect::to_login(from)),
            ProtectedState::OnboardingRequired => Decision::Redirect(Redirect::to(routing::ONBOARDING)),
            ProtectedState::OnboardingRedundant => Decision::Redirect(Redirect::to(routing::HOME)),
            ProtectedState::Authorized => Decision::Render,
        }
    }
}

/// Decision
///
/// What a guard does with the current render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Auth state not restored yet; show a placeholder.
    Placeholder,
    /// Render the nested route.
    Render,
    /// Navigate elsewhere and render nothing.
    Redirect(Redirect),
}

impl Decision {
    pub fn renders_nothing(&self) -> bool {
        !matches!(self, Decision::Render)
    }
}

/// protected_route
///
/// Rules are evaluated in a fixed order and the first match wins, so at most
/// one redirect comes out of a single evaluation:
/// 1. loading → placeholder
/// 2. anonymous → `/login`, remembering `path`
/// 3. incomplete profile off `/onboarding` → `/onboarding` (skipped for super_admin)
/// 4. complete profile on `/onboarding` → `/`
/// 5. otherwise render
pub fn protected_route(auth: &AuthState, path: &str) -> ProtectedState {
    let user = match auth {
        AuthState::Loading => return ProtectedState::Loading,
        AuthState::Ready(None) => {
            return ProtectedState::Unauthenticated {
                from: path.to_string(),
            };
        }
        AuthState::Ready(Some(user)) => user,
    };

    let on_onboarding = routing::normalize(path) == routing::ONBOARDING;

    if !user.is_profile_complete && !user.is_super_admin() && !on_onboarding {
        return ProtectedState::OnboardingRequired;
    }
    if user.is_profile_complete && on_onboarding {
        return ProtectedState::OnboardingRedundant;
    }
    ProtectedState::Authorized
}

/// public_route
///
/// Anonymous visitors always pass. A signed-in user whose profile is incomplete
/// is sent to onboarding, except `super_admin`, who is exempt by policy.
pub fn public_route(auth: &AuthState) -> Decision {
    match auth {
        AuthState::Loading => Decision::Placeholder,
        AuthState::Ready(Some(user)) if !user.is_profile_complete && !user.is_super_admin() => {
            Decision::Redirect(Redirect::to(routing::ONBOARDING))
        }
        AuthState::Ready(_) => Decision::Render,
    }
}

/// OnboardingPolicy
///
/// `exempt_super_admin` aligns `OnboardingGuard` with `PublicRoute`. It is off
/// by default: the guard then applies to every role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingPolicy {
    pub allow_list: RouteTable,
    pub exempt_super_admin: bool,
}

impl Default for OnboardingPolicy {
    fn default() -> Self {
        Self {
            allow_list: RouteTable::onboarding_allow_list(),
            exempt_super_admin: false,
        }
    }
}

/// onboarding_guard
///
/// Renders nothing and redirects to `/onboarding` exactly when the user is
/// signed in, the profile is incomplete and `path` is outside the allow-list.
/// A context that is still loading has no user yet and passes through.
pub fn onboarding_guard(auth: &AuthState, path: &str, policy: &OnboardingPolicy) -> Decision {
    let Some(user) = auth.user() else {
        return Decision::Render;
    };
    if user.is_profile_complete || policy.allow_list.matches(path) {
        return Decision::Render;
    }
    if policy.exempt_super_admin && user.is_super_admin() {
        return Decision::Render;
    }
    Decision::Redirect(Redirect::to(routing::ONBOARDING))
}

/// The landing spot after any sign-in: onboarding first if the profile still
/// needs it, then the remembered location, then home.
pub fn post_login_destination(user: &User, from: Option<&str>) -> String {
    if !user.is_profile_complete && !user.is_super_admin() {
        return routing::ONBOARDING.to_string();
    }
    routing::safe_return_path(from)
        .filter(|location| !RoutePattern::Prefix(routing::LOGIN).matches(routing::path_of(location)))
        .unwrap_or(routing::HOME)
        .to_string()
}
